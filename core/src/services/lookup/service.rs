//! Lookup orchestrator over all registered providers

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use sd_shared::phone::{mask_phone_number, to_mainland_mobile};

use crate::domain::entities::{BatchPhoneResult, PhoneResult};
use crate::errors::LookupError;

use super::cache::TtlCache;
use super::config::LookupServiceConfig;
use super::traits::PhoneProvider;
use super::types::ProviderStatus;

/// Single `lookup`/`batch_lookup` facade over every provider
///
/// Providers are tried in ascending priority. Successful results are cached
/// by normalized number; cache hits are tagged `"<provider>(cached)"`.
/// Public methods never fail: errors are reported in the result shape.
pub struct PhoneLookupService {
    /// Registered providers, sorted by priority
    providers: Vec<Arc<dyn PhoneProvider>>,
    /// Orchestrator-level cache, independent of provider caches
    cache: TtlCache<PhoneResult>,
    config: LookupServiceConfig,
}

impl PhoneLookupService {
    /// Create a lookup service over `providers`
    pub fn new(mut providers: Vec<Arc<dyn PhoneProvider>>, config: LookupServiceConfig) -> Self {
        providers.sort_by_key(|p| p.priority());

        info!(
            providers = ?providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            cache_enabled = config.cache_enabled,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            "Phone lookup service initialized"
        );

        Self {
            providers,
            cache: TtlCache::new(config.cache_ttl),
            config,
        }
    }

    /// Registered providers in priority order
    pub fn providers(&self) -> &[Arc<dyn PhoneProvider>] {
        &self.providers
    }

    /// Providers that report themselves available, in priority order
    pub async fn available_providers(&self) -> Vec<Arc<dyn PhoneProvider>> {
        let mut available = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            if provider.is_available().await {
                available.push(Arc::clone(provider));
            } else {
                debug!(provider = provider.name(), "Provider unavailable, skipping");
            }
        }
        available.sort_by_key(|p| p.priority());
        available
    }

    /// Look up one number, falling back across providers
    pub async fn lookup(&self, phone: &str) -> PhoneResult {
        let Some(number) = to_mainland_mobile(phone) else {
            warn!(phone = %mask_phone_number(phone), "Rejected malformed phone number");
            return PhoneResult::failure(LookupError::invalid_phone(phone), None);
        };

        if let Some(hit) = self.cached(&number).await {
            debug!(phone = %mask_phone_number(&number), "Lookup served from cache");
            return hit;
        }

        let providers = self.available_providers().await;
        if providers.is_empty() {
            warn!("No lookup provider available");
            return PhoneResult::failure(LookupError::NoProviderAvailable, None);
        }

        let mut last_error = None;
        for provider in &providers {
            let result = self.lookup_with_retry(provider, &number).await;
            if result.success {
                info!(
                    phone = %mask_phone_number(&number),
                    provider = provider.name(),
                    "Carrier lookup succeeded"
                );
                self.store(&number, &result).await;
                return result;
            }

            warn!(
                phone = %mask_phone_number(&number),
                provider = provider.name(),
                error = result.error.as_deref().unwrap_or("unknown"),
                "Provider lookup failed, trying next provider"
            );
            last_error = result.error;
        }

        PhoneResult::failure(
            LookupError::Exhausted {
                last_error: last_error.unwrap_or_default(),
            },
            None,
        )
    }

    /// Look up many numbers
    ///
    /// Cached numbers are answered first. The rest go through batch-capable
    /// providers in priority order, each receiving only the numbers still
    /// unresolved; once a batch provider resolves more numbers than it fails,
    /// no further batch provider is asked. Whatever remains is resolved one
    /// number at a time by the single-number providers. Every requested
    /// number has an entry in the result.
    pub async fn batch_lookup(&self, phones: &[String]) -> BatchPhoneResult {
        let mut results: HashMap<String, PhoneResult> = HashMap::with_capacity(phones.len());
        // normalized number -> spellings the caller used for it
        let mut spellings: HashMap<String, Vec<String>> = HashMap::new();
        let mut candidates = Vec::new();
        let mut seen = HashSet::new();

        for phone in phones {
            if !seen.insert(phone.as_str()) {
                continue;
            }
            match to_mainland_mobile(phone) {
                Some(number) => {
                    let requested = spellings.entry(number.clone()).or_default();
                    if requested.is_empty() {
                        candidates.push(number);
                    }
                    requested.push(phone.clone());
                }
                None => {
                    results.insert(
                        phone.clone(),
                        PhoneResult::failure(LookupError::invalid_phone(phone), None),
                    );
                }
            }
        }

        let mut resolved: HashMap<String, PhoneResult> = HashMap::with_capacity(candidates.len());
        let mut unresolved = Vec::new();
        for number in candidates {
            match self.cached(&number).await {
                Some(hit) => {
                    resolved.insert(number, hit);
                }
                None => unresolved.push(number),
            }
        }

        info!(
            requested = phones.len(),
            invalid = results.len(),
            cache_hits = resolved.len(),
            to_resolve = unresolved.len(),
            "Starting batch carrier lookup"
        );

        let providers = if unresolved.is_empty() {
            Vec::new()
        } else {
            self.available_providers().await
        };
        let mut used_providers: Vec<String> = Vec::new();
        let mut last_errors: HashMap<String, String> = HashMap::new();

        for provider in providers.iter().filter(|p| p.supports_batch()) {
            if unresolved.is_empty() {
                break;
            }

            let batch = provider.batch_lookup(&unresolved).await;
            info!(
                provider = provider.name(),
                requested = unresolved.len(),
                succeeded = batch.success_count,
                failed = batch.failure_count,
                "Batch provider finished"
            );

            let mut still_unresolved = Vec::new();
            for number in std::mem::take(&mut unresolved) {
                match batch.results.get(&number) {
                    Some(result) if result.success => {
                        self.store(&number, result).await;
                        resolved.insert(number, result.clone());
                    }
                    Some(result) => {
                        if let Some(error) = &result.error {
                            last_errors.insert(number.clone(), error.clone());
                        }
                        still_unresolved.push(number);
                    }
                    None => still_unresolved.push(number),
                }
            }
            unresolved = still_unresolved;

            if batch.success_count > 0 {
                used_providers.push(provider.name().to_string());
            }
            if batch.success_count > batch.failure_count {
                break;
            }
        }

        let single_providers: Vec<_> = providers.iter().filter(|p| !p.supports_batch()).collect();
        for number in unresolved {
            let mut outcome = None;
            for provider in &single_providers {
                let result = self.lookup_with_retry(provider, &number).await;
                if result.success {
                    self.store(&number, &result).await;
                    if !used_providers.iter().any(|n| n == provider.name()) {
                        used_providers.push(provider.name().to_string());
                    }
                    outcome = Some(result);
                    break;
                }
                if let Some(error) = result.error {
                    last_errors.insert(number.clone(), error);
                }
            }

            let result = outcome.unwrap_or_else(|| {
                if providers.is_empty() {
                    PhoneResult::failure(LookupError::NoProviderAvailable, None)
                } else {
                    PhoneResult::failure(
                        LookupError::Exhausted {
                            last_error: last_errors.remove(&number).unwrap_or_default(),
                        },
                        None,
                    )
                }
            });
            resolved.insert(number, result);
        }

        for (number, result) in resolved {
            if let Some(requested) = spellings.remove(&number) {
                for spelling in requested {
                    results.insert(spelling, result.clone());
                }
            }
        }

        let provider = if used_providers.is_empty() {
            None
        } else {
            Some(used_providers.join(","))
        };
        let batch = BatchPhoneResult::from_results(results, provider);
        info!(
            total = batch.total_count,
            succeeded = batch.success_count,
            failed = batch.failure_count,
            "Batch carrier lookup finished"
        );
        batch
    }

    /// Route credentials to providers by name (case-insensitive). Blank
    /// tokens clear the credential. Returns how many providers were updated.
    pub async fn set_tokens(&self, tokens: &HashMap<String, String>) -> usize {
        let mut applied = 0;
        for (name, token) in tokens {
            match self
                .providers
                .iter()
                .find(|p| p.name().eq_ignore_ascii_case(name))
            {
                Some(provider) => {
                    let token = Some(token.trim().to_string()).filter(|t| !t.is_empty());
                    info!(provider = provider.name(), cleared = token.is_none(), "Updating provider token");
                    provider.set_token(token).await;
                    applied += 1;
                }
                None => warn!(provider = %name, "Token for unknown provider ignored"),
            }
        }
        applied
    }

    /// Clear the orchestrator cache and every provider cache
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        for provider in &self.providers {
            provider.clear_cache().await;
        }
        info!("Lookup caches cleared");
    }

    /// Number of fresh orchestrator cache entries
    pub async fn cache_size(&self) -> usize {
        self.cache.len().await
    }

    /// Availability snapshot of every registered provider
    pub async fn provider_status(&self) -> Vec<ProviderStatus> {
        let mut status = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            status.push(ProviderStatus {
                name: provider.name().to_string(),
                priority: provider.priority(),
                supports_batch: provider.supports_batch(),
                available: provider.is_available().await,
            });
        }
        status
    }

    async fn lookup_with_retry(&self, provider: &Arc<dyn PhoneProvider>, number: &str) -> PhoneResult {
        let outcome = self
            .config
            .retry
            .run(|attempt| {
                let provider = Arc::clone(provider);
                let number = number.to_string();
                async move {
                    debug!(provider = provider.name(), attempt, "Provider lookup attempt");
                    let result = provider.lookup(&number).await;
                    if result.success {
                        Ok(result)
                    } else {
                        Err(result)
                    }
                }
            })
            .await;

        match outcome {
            Ok(result) | Err(result) => result,
        }
    }

    async fn cached(&self, number: &str) -> Option<PhoneResult> {
        if !self.config.cache_enabled {
            return None;
        }
        self.cache.get(number).await.map(|hit| hit.as_cached())
    }

    async fn store(&self, number: &str, result: &PhoneResult) {
        if self.config.cache_enabled {
            self.cache.insert(number, result.clone()).await;
        }
    }
}
