//! Configuration for the lookup service

use std::time::Duration;

use sd_shared::config::LookupConfig;

use crate::services::retry::RetryPolicy;

/// Default orchestrator cache TTL (1 hour)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Configuration for the lookup service
#[derive(Debug, Clone)]
pub struct LookupServiceConfig {
    /// Whether successful lookups are cached
    pub cache_enabled: bool,
    /// How long a cached lookup stays valid
    pub cache_ttl: Duration,
    /// Retry applied to each provider attempt
    pub retry: RetryPolicy,
}

impl Default for LookupServiceConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl: DEFAULT_CACHE_TTL,
            retry: RetryPolicy::none(),
        }
    }
}

impl From<&LookupConfig> for LookupServiceConfig {
    fn from(settings: &LookupConfig) -> Self {
        Self {
            cache_enabled: settings.cache_enabled,
            cache_ttl: Duration::from_secs(settings.cache_ttl_secs),
            retry: RetryPolicy::fixed(
                settings.retry_attempts,
                Duration::from_millis(settings.retry_delay_ms),
            ),
        }
    }
}
