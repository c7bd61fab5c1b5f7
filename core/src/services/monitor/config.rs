//! Configuration for the background SMS monitor

use std::time::Duration;

use sd_shared::config::MonitorSettings;

use crate::services::retry::Backoff;

/// Polls without a final answer before a record is marked stopped
pub const MAX_RETRY_COUNT: u32 = 15;

/// Configuration for the background SMS monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between poll ticks
    pub poll_interval: Duration,
    /// Maximum number of tasks processed per tick
    pub batch_size: usize,
    /// Polls without a final answer before giving up
    pub max_retry_count: u32,
    /// Pause between two status queries within a tick
    pub pacing_delay: Duration,
    /// Wait after the n-th unanswered poll before polling again
    pub backoff: Backoff,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            batch_size: 10,
            max_retry_count: MAX_RETRY_COUNT,
            pacing_delay: Duration::from_secs(1),
            backoff: Backoff::Exponential {
                base: Duration::from_secs(60),
                cap: Duration::from_secs(600),
            },
        }
    }
}

impl From<&MonitorSettings> for MonitorConfig {
    fn from(settings: &MonitorSettings) -> Self {
        Self {
            poll_interval: Duration::from_secs(settings.interval_secs.max(1)),
            batch_size: settings.batch_size.max(1),
            max_retry_count: settings.max_retry_count,
            ..Self::default()
        }
    }
}
