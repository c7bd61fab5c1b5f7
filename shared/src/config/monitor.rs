//! Background SMS monitor configuration

use serde::{Deserialize, Serialize};

use super::env_or;

/// Deployment settings of the background SMS delivery-status monitor
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorSettings {
    /// Base URL of the SMS status API
    pub status_api_url: String,

    /// Status API request timeout in seconds
    pub status_api_timeout_secs: u64,

    /// Seconds between poll ticks
    pub interval_secs: u64,

    /// Maximum tasks processed per tick
    pub batch_size: usize,

    /// Polling attempts before a record is marked as stopped
    pub max_retry_count: u32,

    /// Start the monitor when the server boots
    pub autostart: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            status_api_url: String::from("http://localhost:3030"),
            status_api_timeout_secs: 10,
            interval_secs: 30,
            batch_size: 10,
            max_retry_count: 15,
            autostart: true,
        }
    }
}

impl MonitorSettings {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            status_api_url: std::env::var("SMS_STATUS_API_URL")
                .unwrap_or(defaults.status_api_url),
            status_api_timeout_secs: env_or(
                "SMS_STATUS_API_TIMEOUT_SECS",
                defaults.status_api_timeout_secs,
            ),
            interval_secs: env_or("SMS_MONITOR_INTERVAL_SECS", defaults.interval_secs).max(1),
            batch_size: env_or("SMS_MONITOR_BATCH_SIZE", defaults.batch_size).max(1),
            max_retry_count: env_or("SMS_MONITOR_MAX_RETRY", defaults.max_retry_count),
            autostart: env_or("SMS_MONITOR_AUTOSTART", defaults.autostart),
        }
    }
}
