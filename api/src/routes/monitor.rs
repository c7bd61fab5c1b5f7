//! Background SMS monitor endpoints

use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use sd_core::repositories::SmsRecordRepository;
use sd_core::services::monitor::SmsStatusClient;
use sd_shared::types::ApiResponse;

use crate::dto::{AddTaskRequest, AddTaskResponse, MonitorStateResponse};
use crate::handlers::{handle_domain_error_with_lang, validation_error, Language};

use super::AppState;

/// Handler for GET /api/sms-monitor
pub async fn status<R, C>(state: web::Data<AppState<R, C>>) -> HttpResponse
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    HttpResponse::Ok().json(ApiResponse::success(state.monitor.status().await))
}

/// Handler for POST /api/sms-monitor/start
///
/// Starting with nothing pending is not an error; the monitor stays idle.
pub async fn start<R, C>(req: HttpRequest, state: web::Data<AppState<R, C>>) -> HttpResponse
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    match state.monitor.start().await {
        Ok(running) => {
            let message = if running {
                "Monitor running"
            } else {
                "No SMS awaiting delivery status"
            };
            HttpResponse::Ok().json(ApiResponse::success(MonitorStateResponse {
                running,
                message: message.to_string(),
            }))
        }
        Err(e) => handle_domain_error_with_lang(e, Language::from_request(&req)),
    }
}

/// Handler for POST /api/sms-monitor/stop
pub async fn stop<R, C>(state: web::Data<AppState<R, C>>) -> HttpResponse
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    let stopped = state.monitor.stop().await;
    let message = if stopped {
        "Monitor stopped"
    } else {
        "Monitor was not running"
    };
    HttpResponse::Ok().json(ApiResponse::success(MonitorStateResponse {
        running: state.monitor.is_running(),
        message: message.to_string(),
    }))
}

/// Handler for POST /api/sms-monitor/poll
///
/// Runs one tick right away, outside the interval.
pub async fn poll_now<R, C>(state: web::Data<AppState<R, C>>) -> HttpResponse
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    HttpResponse::Ok().json(ApiResponse::success(state.monitor.poll_once().await))
}

/// Handler for POST /api/sms-monitor/tasks
pub async fn add_task<R, C>(
    req: HttpRequest,
    state: web::Data<AppState<R, C>>,
    body: web::Json<AddTaskRequest>,
) -> HttpResponse
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    let lang = Language::from_request(&req);
    if let Err(errors) = body.validate() {
        return validation_error(&errors, lang);
    }

    match state
        .monitor
        .add_sms_for_monitoring(&body.out_id, &body.phone_number)
        .await
    {
        Ok(added) => HttpResponse::Ok().json(ApiResponse::success(AddTaskResponse {
            added,
            running: state.monitor.is_running(),
        })),
        Err(e) => handle_domain_error_with_lang(e, lang),
    }
}

/// Handler for POST /api/sms-monitor/tasks/{out_id}/recheck
pub async fn recheck<R, C>(
    req: HttpRequest,
    state: web::Data<AppState<R, C>>,
    path: web::Path<String>,
) -> HttpResponse
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    let out_id = path.into_inner();
    match state.monitor.recheck(&out_id).await {
        Ok(record) => HttpResponse::Ok().json(ApiResponse::success(record)),
        Err(e) => handle_domain_error_with_lang(e, Language::from_request(&req)),
    }
}
