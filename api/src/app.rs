//! Application factory
//!
//! Builds the actix-web application around an [`AppState`].

use actix_web::{web, App, HttpResponse};
use tracing_actix_web::TracingLogger;

use sd_core::repositories::SmsRecordRepository;
use sd_core::services::monitor::SmsStatusClient;
use sd_shared::types::ApiResponse;

use crate::handlers::{json_error_handler, query_error_handler};
use crate::middleware::create_cors;
use crate::routes::{health, lookup, monitor, AppState};

/// Create and configure the application with all dependencies
pub fn create_app<R, C>(
    app_state: web::Data<AppState<R, C>>,
    max_payload_size: usize,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<
            impl actix_web::body::MessageBody,
        >,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    let environment = app_state.environment;

    App::new()
        .app_data(app_state)
        .app_data(
            web::JsonConfig::default()
                .limit(max_payload_size)
                .error_handler(json_error_handler),
        )
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .wrap(create_cors(environment))
        .wrap(TracingLogger::default())
        .route("/health", web::get().to(health::health_check::<R, C>))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/phone-lookup")
                        .route("", web::get().to(lookup::lookup_phone::<R, C>))
                        .route("/batch", web::post().to(lookup::batch_lookup::<R, C>))
                        .route("/providers", web::get().to(lookup::provider_status::<R, C>))
                        .route("/tokens", web::put().to(lookup::set_tokens::<R, C>))
                        .route("/cache", web::delete().to(lookup::clear_cache::<R, C>)),
                )
                .service(
                    web::scope("/sms-monitor")
                        .route("", web::get().to(monitor::status::<R, C>))
                        .route("/start", web::post().to(monitor::start::<R, C>))
                        .route("/stop", web::post().to(monitor::stop::<R, C>))
                        .route("/poll", web::post().to(monitor::poll_now::<R, C>))
                        .route("/tasks", web::post().to(monitor::add_task::<R, C>))
                        .route(
                            "/tasks/{out_id}/recheck",
                            web::post().to(monitor::recheck::<R, C>),
                        ),
                ),
        )
        .default_service(web::route().to(not_found))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::<()>::error(
        "The requested resource was not found",
    ))
}
