use actix_web::{web, HttpServer};
use tracing::{info, warn};

use sd_api::app::create_app;
use sd_api::config::{infrastructure_config, init_tracing};
use sd_api::routes::AppState;
use sd_shared::config::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    init_tracing(&config.logging)?;

    info!(environment = %config.environment, "Starting SmsDesk API server");

    let services = sd_infra::initialize(&infrastructure_config(&config)).await?;
    match services.pool.health_check().await {
        Ok(true) => info!(stats = %services.pool.statistics(), "Database reachable"),
        Ok(false) | Err(_) => warn!("Database health check failed"),
    }

    if config.monitor.autostart {
        match services.monitor.start().await {
            Ok(true) => info!("SMS monitor started on boot"),
            Ok(false) => info!("SMS monitor idle, nothing pending"),
            Err(e) => warn!(error = %e, "SMS monitor could not start on boot"),
        }
    }

    let state = web::Data::new(
        AppState::new(services.lookup.clone(), services.monitor.clone())
            .with_environment(config.environment),
    );
    let max_payload_size = config.server.max_payload_size;

    let bind_address = config.server.bind_address();
    info!(address = %bind_address, "Server will bind");

    let mut server = HttpServer::new(move || create_app(state.clone(), max_payload_size));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }
    server.bind(&bind_address)?.run().await?;

    info!("Server stopped, shutting down SMS monitor");
    services.monitor.stop().await;
    services.pool.close().await;
    Ok(())
}
