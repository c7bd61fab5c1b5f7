//! chahaoba.com batch carrier lookup provider
//!
//! Batch-capable and token based. Resolved numbers are cached for the
//! lifetime of the process; carrier assignments rarely change and the API
//! is metered.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use sd_core::domain::entities::{BatchPhoneResult, PhoneInfo, PhoneResult, UNKNOWN_REGION};
use sd_core::errors::LookupError;
use sd_core::services::lookup::{PhoneProvider, TtlCache};
use sd_shared::phone::{mask_phone_number, to_mainland_mobile};

use super::throttle::RequestThrottle;
use super::tool_lu::normalize_carrier;
use super::transport::{HttpRequest, HttpTransport};
use crate::InfrastructureError;

pub const CHAHAOBA_PROVIDER_NAME: &str = "chahaoba";

/// Most numbers accepted by one batch request
pub const MAX_BATCH_SIZE: usize = 20;

/// Settings of the chahaoba provider
#[derive(Debug, Clone)]
pub struct ChahaobaConfig {
    pub batch_url: String,
    pub timeout: Duration,
    /// Minimum spacing between any two requests
    pub min_interval: Duration,
    /// Pause between the chunks of one batch
    pub chunk_delay: Duration,
    /// Number queried by the availability probe
    pub probe_number: String,
    /// How long a probe result is trusted
    pub availability_ttl: Duration,
}

impl Default for ChahaobaConfig {
    fn default() -> Self {
        Self {
            batch_url: "https://www.chahaoba.com/api/v1/batch".to_string(),
            timeout: Duration::from_secs(30),
            min_interval: Duration::from_secs(1),
            chunk_delay: Duration::from_secs(1),
            probe_number: "13800138000".to_string(),
            availability_ttl: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChahaobaResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<Vec<ChahaobaEntry>>,
}

#[derive(Debug, Deserialize)]
struct ChahaobaEntry {
    phone: String,
    #[serde(default)]
    isp: Option<String>,
    #[serde(default)]
    province: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    area_code: Option<String>,
}

impl ChahaobaEntry {
    fn into_info(self) -> (String, PhoneInfo) {
        let number = to_mainland_mobile(&self.phone).unwrap_or(self.phone);
        let carrier = normalize_carrier(self.isp.as_deref().unwrap_or_default());
        let province = self
            .province
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_REGION.to_string());
        let city = self
            .city
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| province.clone());
        let note = self
            .area_code
            .filter(|a| !a.trim().is_empty())
            .map(|a| format!("区号: {}", a))
            .unwrap_or_default();

        let info = PhoneInfo::new(number.clone(), carrier, province, city).with_note(note);
        (number, info)
    }
}

#[derive(Debug, Clone, Copy)]
struct Availability {
    available: bool,
    checked_at: Instant,
}

/// Batch carrier lookup through chahaoba.com
pub struct ChahaobaProvider {
    transport: Arc<dyn HttpTransport>,
    config: ChahaobaConfig,
    token: RwLock<Option<String>>,
    cache: TtlCache<PhoneResult>,
    throttle: RequestThrottle,
    availability: RwLock<Option<Availability>>,
}

impl ChahaobaProvider {
    pub fn new(transport: Arc<dyn HttpTransport>, token: Option<String>) -> Self {
        Self::with_config(transport, token, ChahaobaConfig::default())
    }

    pub fn with_config(
        transport: Arc<dyn HttpTransport>,
        token: Option<String>,
        config: ChahaobaConfig,
    ) -> Self {
        Self {
            transport,
            token: RwLock::new(token.filter(|t| !t.trim().is_empty())),
            cache: TtlCache::unbounded(),
            throttle: RequestThrottle::new(config.min_interval),
            availability: RwLock::new(None),
            config,
        }
    }

    fn transport_error(&self, err: InfrastructureError) -> LookupError {
        match err {
            InfrastructureError::Timeout(_) => LookupError::Timeout {
                provider: CHAHAOBA_PROVIDER_NAME.to_string(),
                seconds: self.config.timeout.as_secs(),
            },
            other => LookupError::network(CHAHAOBA_PROVIDER_NAME, other),
        }
    }

    /// One POST for at most [`MAX_BATCH_SIZE`] normalized numbers
    async fn query_chunk(
        &self,
        token: &str,
        chunk: &[String],
    ) -> Result<HashMap<String, PhoneInfo>, LookupError> {
        self.throttle.acquire().await;

        let request = HttpRequest::post_json(
            self.config.batch_url.clone(),
            serde_json::json!({ "phones": chunk }),
        )
        .header("Authorization", format!("Bearer {}", token))
        .timeout(self.config.timeout);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| self.transport_error(e))?;

        if matches!(response.status, 401 | 403) {
            return Err(LookupError::authentication(
                CHAHAOBA_PROVIDER_NAME,
                "token expired or invalid",
            ));
        }
        if !response.is_success() {
            return Err(LookupError::upstream(
                CHAHAOBA_PROVIDER_NAME,
                format!("HTTP {}", response.status),
            ));
        }

        let body: ChahaobaResponse = response.json().map_err(|e| {
            LookupError::upstream(CHAHAOBA_PROVIDER_NAME, format!("malformed response: {}", e))
        })?;
        if body.code != 0 {
            let message = body
                .msg
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| format!("error code {}", body.code));
            return Err(LookupError::upstream(CHAHAOBA_PROVIDER_NAME, message));
        }

        Ok(body
            .data
            .unwrap_or_default()
            .into_iter()
            .map(ChahaobaEntry::into_info)
            .collect())
    }

    /// Resolve normalized, uncached numbers chunk by chunk
    async fn fetch(&self, token: &str, numbers: &[String]) -> HashMap<String, PhoneResult> {
        let mut resolved = HashMap::with_capacity(numbers.len());

        for (index, chunk) in numbers.chunks(MAX_BATCH_SIZE).enumerate() {
            if index > 0 && !self.config.chunk_delay.is_zero() {
                tokio::time::sleep(self.config.chunk_delay).await;
            }

            match self.query_chunk(token, chunk).await {
                Ok(mut found) => {
                    debug!(
                        requested = chunk.len(),
                        found = found.len(),
                        "chahaoba chunk answered"
                    );
                    for number in chunk {
                        let result = match found.remove(number) {
                            Some(info) => {
                                let result = PhoneResult::success(info, CHAHAOBA_PROVIDER_NAME);
                                self.cache.insert(number.as_str(), result.clone()).await;
                                result
                            }
                            None => PhoneResult::failure(
                                LookupError::upstream(
                                    CHAHAOBA_PROVIDER_NAME,
                                    "number missing from response",
                                ),
                                Some(CHAHAOBA_PROVIDER_NAME),
                            ),
                        };
                        resolved.insert(number.clone(), result);
                    }
                }
                Err(e) => {
                    warn!(chunk = index, size = chunk.len(), error = %e, "chahaoba chunk failed");
                    for number in chunk {
                        resolved.insert(
                            number.clone(),
                            PhoneResult::failure(&e, Some(CHAHAOBA_PROVIDER_NAME)),
                        );
                    }
                }
            }
        }

        resolved
    }
}

#[async_trait]
impl PhoneProvider for ChahaobaProvider {
    fn name(&self) -> &str {
        CHAHAOBA_PROVIDER_NAME
    }

    fn priority(&self) -> u8 {
        1
    }

    fn supports_batch(&self) -> bool {
        true
    }

    /// Live probe of the token, remembered for `availability_ttl`
    async fn is_available(&self) -> bool {
        let Some(token) = self.token.read().await.clone() else {
            return false;
        };

        if let Some(last) = *self.availability.read().await {
            if last.checked_at.elapsed() < self.config.availability_ttl {
                return last.available;
            }
        }

        let probe = vec![self.config.probe_number.clone()];
        let available = match self.query_chunk(&token, &probe).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "chahaoba availability probe failed");
                false
            }
        };

        *self.availability.write().await = Some(Availability {
            available,
            checked_at: Instant::now(),
        });
        available
    }

    async fn lookup(&self, phone: &str) -> PhoneResult {
        let mut batch = self.batch_lookup(&[phone.to_string()]).await;
        batch.results.remove(phone).unwrap_or_else(|| {
            PhoneResult::failure(
                LookupError::upstream(CHAHAOBA_PROVIDER_NAME, "empty batch result"),
                Some(CHAHAOBA_PROVIDER_NAME),
            )
        })
    }

    async fn batch_lookup(&self, phones: &[String]) -> BatchPhoneResult {
        let mut results: HashMap<String, PhoneResult> = HashMap::with_capacity(phones.len());
        // normalized number -> spellings the caller used
        let mut pending: HashMap<String, Vec<String>> = HashMap::new();
        let mut to_fetch = Vec::new();
        let mut seen = HashSet::new();

        for phone in phones {
            if !seen.insert(phone.as_str()) {
                continue;
            }
            let Some(number) = to_mainland_mobile(phone) else {
                results.insert(
                    phone.clone(),
                    PhoneResult::failure(LookupError::invalid_phone(phone), Some(CHAHAOBA_PROVIDER_NAME)),
                );
                continue;
            };

            if let Some(hit) = self.cache.get(&number).await {
                results.insert(phone.clone(), hit.as_cached());
                continue;
            }

            let spellings = pending.entry(number.clone()).or_default();
            if spellings.is_empty() {
                to_fetch.push(number);
            }
            spellings.push(phone.clone());
        }

        if !to_fetch.is_empty() {
            let token = self.token.read().await.clone();
            let fetched = match token {
                Some(token) => {
                    info!(
                        numbers = to_fetch.len(),
                        chunks = (to_fetch.len() + MAX_BATCH_SIZE - 1) / MAX_BATCH_SIZE,
                        "chahaoba batch lookup"
                    );
                    self.fetch(&token, &to_fetch).await
                }
                None => to_fetch
                    .iter()
                    .map(|n| {
                        let error = LookupError::NotConfigured {
                            provider: CHAHAOBA_PROVIDER_NAME.to_string(),
                        };
                        (n.clone(), PhoneResult::failure(error, Some(CHAHAOBA_PROVIDER_NAME)))
                    })
                    .collect(),
            };

            for (number, result) in fetched {
                if result.success {
                    debug!(phone = %mask_phone_number(&number), "chahaoba resolved number");
                }
                for spelling in pending.remove(&number).unwrap_or_default() {
                    results.insert(spelling, result.clone());
                }
            }
        }

        BatchPhoneResult::from_results(results, Some(CHAHAOBA_PROVIDER_NAME.to_string()))
    }

    async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token.filter(|t| !t.trim().is_empty());
        *self.availability.write().await = None;
        info!("chahaoba token updated");
    }

    async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}
