//! Process-level setup of the API binary

use sd_infra::config::InfrastructureConfig;
use sd_shared::config::{AppConfig, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

/// The infrastructure part of the application configuration
pub fn infrastructure_config(config: &AppConfig) -> InfrastructureConfig {
    InfrastructureConfig {
        database: config.database.clone(),
        lookup: config.lookup.clone(),
        monitor: config.monitor.clone(),
    }
}
