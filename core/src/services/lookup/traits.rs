//! Provider contract for carrier lookup sources

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::entities::{BatchPhoneResult, PhoneResult};

/// A source of carrier information
///
/// Implementations never return errors: every failure, including malformed
/// input, is reported as a `PhoneResult` with `success: false`. Malformed
/// numbers must be rejected before any network I/O.
#[async_trait]
pub trait PhoneProvider: Send + Sync {
    /// Stable provider name, used for tagging results and token routing
    fn name(&self) -> &str;

    /// Lower values are tried first
    fn priority(&self) -> u8;

    /// Whether `batch_lookup` resolves several numbers per request
    fn supports_batch(&self) -> bool {
        false
    }

    /// Whether the provider can currently serve lookups
    async fn is_available(&self) -> bool {
        true
    }

    /// Look up a single number
    async fn lookup(&self, phone: &str) -> PhoneResult;

    /// Look up several numbers. The default resolves them one by one.
    async fn batch_lookup(&self, phones: &[String]) -> BatchPhoneResult {
        let mut results = HashMap::with_capacity(phones.len());
        for phone in phones {
            let result = self.lookup(phone).await;
            results.insert(phone.clone(), result);
        }
        BatchPhoneResult::from_results(results, Some(self.name().to_string()))
    }

    /// Replace the provider credential; `None` clears it
    async fn set_token(&self, _token: Option<String>) {}

    /// Drop provider-level cached results
    async fn clear_cache(&self) {}
}
