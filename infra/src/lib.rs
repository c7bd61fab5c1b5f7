//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for the SmsDesk backend.
//! It provides concrete implementations for the ports defined in `sd_core`:
//!
//! ## Architecture
//!
//! - **Database**: MySQL connection pool and the `sms_records` repository using SQLx
//! - **Lookup**: HTTP transport, request throttle and the tool.lu / chahaoba
//!   carrier providers
//! - **SMS status**: HTTP client of the SMS status API polled by the monitor
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)

use std::sync::Arc;

use sd_core::services::lookup::{
    LookupServiceConfig, OfflineProvider, PhoneLookupService, PhoneProvider,
};
use sd_core::services::monitor::{BackgroundSmsMonitor, MonitorConfig};

// Re-export core types for convenience
pub use sd_core::errors::*;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Carrier lookup providers and their HTTP plumbing
pub mod lookup;

/// SMS status API client
pub mod sms_status;

/// Configuration module for infrastructure services
pub mod config {
    //! Configuration management for infrastructure services
    //!
    //! Handles:
    //! - Database connection settings
    //! - Lookup provider settings and credentials
    //! - SMS status API and monitor settings

    use serde::{Deserialize, Serialize};

    pub use sd_shared::config::{DatabaseConfig, LookupConfig, MonitorSettings};

    /// Infrastructure configuration settings
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct InfrastructureConfig {
        /// Database configuration
        pub database: DatabaseConfig,
        /// Carrier lookup configuration
        pub lookup: LookupConfig,
        /// SMS status API and monitor configuration
        pub monitor: MonitorSettings,
    }

    impl InfrastructureConfig {
        /// Load every section from the environment
        pub fn from_env() -> Self {
            Self {
                database: DatabaseConfig::from_env(),
                lookup: LookupConfig::from_env(),
                monitor: MonitorSettings::from_env(),
            }
        }
    }
}

use config::{InfrastructureConfig, LookupConfig};
use lookup::{ChahaobaProvider, HttpTransport, ReqwestTransport, ToolLuProvider};
use sms_status::HttpSmsStatusClient;

#[cfg(feature = "mysql")]
use database::{DatabasePool, MySqlSmsRecordRepository};

/// Monitor wired to the MySQL repository and the HTTP status client
#[cfg(feature = "mysql")]
pub type SmsMonitor = BackgroundSmsMonitor<MySqlSmsRecordRepository, HttpSmsStatusClient>;

/// Infrastructure service container
#[cfg(feature = "mysql")]
#[derive(Clone)]
pub struct InfrastructureServices {
    pub pool: DatabasePool,
    pub lookup: Arc<PhoneLookupService>,
    pub monitor: Arc<SmsMonitor>,
}

/// Register the carrier providers enabled by `config`
///
/// The offline provider is always registered; chahaoba is registered even
/// without a token so one can be supplied later through `set_tokens`.
pub fn build_lookup_service(
    config: &LookupConfig,
    transport: Arc<dyn HttpTransport>,
) -> PhoneLookupService {
    let mut providers: Vec<Arc<dyn PhoneProvider>> = vec![
        Arc::new(ChahaobaProvider::new(
            transport.clone(),
            config.chahaoba_token.clone(),
        )),
        Arc::new(OfflineProvider::new()),
    ];

    if config.toollu_enabled {
        providers.push(Arc::new(ToolLuProvider::new(transport)));
    }

    PhoneLookupService::new(providers, LookupServiceConfig::from(config))
}

/// Initialize infrastructure services
///
/// This function sets up:
/// - Database connection pool
/// - Carrier lookup providers and the lookup service
/// - SMS status client and the background monitor (not started)
#[cfg(feature = "mysql")]
pub async fn initialize(
    config: &InfrastructureConfig,
) -> Result<InfrastructureServices, InfrastructureError> {
    tracing::info!("Initializing infrastructure services...");

    let pool = DatabasePool::new(config.database.clone()).await?;

    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);
    let lookup = Arc::new(build_lookup_service(&config.lookup, transport.clone()));

    let repository = Arc::new(MySqlSmsRecordRepository::new(pool.inner().clone()));
    let status_client = Arc::new(HttpSmsStatusClient::new(
        transport,
        &config.monitor.status_api_url,
        std::time::Duration::from_secs(config.monitor.status_api_timeout_secs),
    ));
    let monitor = Arc::new(BackgroundSmsMonitor::new(
        repository,
        status_client,
        MonitorConfig::from(&config.monitor),
    ));

    tracing::info!("Infrastructure services initialized successfully");

    Ok(InfrastructureServices {
        pool,
        lookup,
        monitor,
    })
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Remote host could not be reached
    #[error("Connection failed: {0}")]
    Connection(String),
}
