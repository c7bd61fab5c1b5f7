use actix_web::{web, HttpResponse};
use std::collections::HashMap;

use sd_core::repositories::SmsRecordRepository;
use sd_core::services::monitor::SmsStatusClient;
use sd_shared::types::{HealthResponse, HealthStatus, ServiceHealth};

use super::AppState;

/// Handler for GET /health
///
/// Lookup is degraded when no provider reports itself available. An idle
/// monitor is healthy; it stops on its own once nothing is pending.
pub async fn health_check<R, C>(state: web::Data<AppState<R, C>>) -> HttpResponse
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    let available = state.lookup.available_providers().await.len();
    let lookup = ServiceHealth {
        status: if available > 0 {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        message: Some(format!(
            "{}/{} providers available",
            available,
            state.lookup.providers().len()
        )),
    };

    let monitor_status = state.monitor.status().await;
    let monitor = ServiceHealth {
        status: HealthStatus::Healthy,
        message: Some(format!(
            "{}, {} queued",
            if monitor_status.running { "running" } else { "idle" },
            monitor_status.queue_length
        )),
    };

    let mut services = HashMap::new();
    services.insert("lookup".to_string(), lookup);
    services.insert("monitor".to_string(), monitor);

    HttpResponse::Ok().json(HealthResponse::from_services(
        services,
        env!("CARGO_PKG_VERSION"),
    ))
}
