//! Phone carrier lookup configuration

use serde::{Deserialize, Serialize};

use super::env_or;

/// Settings for the lookup orchestrator and its network providers
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LookupConfig {
    /// Whether the orchestrator caches successful lookups
    pub cache_enabled: bool,

    /// Orchestrator cache TTL in seconds
    pub cache_ttl_secs: u64,

    /// Attempts per provider in the orchestrator (1 = no retry)
    pub retry_attempts: u32,

    /// Fixed delay between orchestrator attempts in milliseconds
    pub retry_delay_ms: u64,

    /// Bearer token for the chahaoba batch API
    #[serde(default)]
    pub chahaoba_token: Option<String>,

    /// Whether the tool.lu provider is registered
    pub toollu_enabled: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl_secs: 3600,
            retry_attempts: 1,
            retry_delay_ms: 1000,
            chahaoba_token: None,
            toollu_enabled: true,
        }
    }
}

impl LookupConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_enabled: env_or("LOOKUP_CACHE_ENABLED", defaults.cache_enabled),
            cache_ttl_secs: env_or("LOOKUP_CACHE_TTL_SECS", defaults.cache_ttl_secs),
            retry_attempts: env_or("LOOKUP_RETRY_ATTEMPTS", defaults.retry_attempts).max(1),
            retry_delay_ms: env_or("LOOKUP_RETRY_DELAY_MS", defaults.retry_delay_ms),
            chahaoba_token: std::env::var("CHAHAOBA_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            toollu_enabled: env_or("TOOLLU_ENABLED", defaults.toollu_enabled),
        }
    }
}
