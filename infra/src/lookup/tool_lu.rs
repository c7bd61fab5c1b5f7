//! tool.lu carrier lookup provider
//!
//! Single-number lookups against the tool.lu mobile segment page. The ajax
//! endpoint only answers requests that carry the session cookie handed out
//! by the homepage, so a cookie is fetched lazily and reused for 30 minutes.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use sd_core::domain::entities::{
    PhoneInfo, PhoneResult, CARRIER_BROADNET, CARRIER_MOBILE, CARRIER_OTHER, CARRIER_TELECOM,
    CARRIER_UNICOM, UNKNOWN_REGION,
};
use sd_core::errors::LookupError;
use sd_core::services::lookup::{PhoneProvider, TtlCache};
use sd_core::services::retry::RetryPolicy;
use sd_shared::phone::{mask_phone_number, to_mainland_mobile};

use super::throttle::RequestThrottle;
use super::transport::{HttpRequest, HttpTransport};
use crate::InfrastructureError;

pub const TOOLLU_PROVIDER_NAME: &str = "toollu";

/// Settings of the tool.lu provider
#[derive(Debug, Clone)]
pub struct ToolLuConfig {
    /// Site root, also the page handing out the session cookie
    pub base_url: String,
    pub timeout: Duration,
    /// Minimum spacing between two requests
    pub min_interval: Duration,
    /// How long a session cookie is reused
    pub session_ttl: Duration,
    /// How long a successful lookup is cached
    pub cache_ttl: Duration,
    pub retry: RetryPolicy,
}

impl Default for ToolLuConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tool.lu".to_string(),
            timeout: Duration::from_secs(15),
            min_interval: Duration::from_secs(2),
            session_ttl: Duration::from_secs(30 * 60),
            cache_ttl: Duration::from_secs(3600),
            retry: RetryPolicy::linear(3, Duration::from_secs(1)),
        }
    }
}

impl ToolLuConfig {
    fn home_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }

    fn query_url(&self) -> String {
        format!("{}/mobile/ajax.html", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone)]
struct Session {
    cookie: Option<String>,
    obtained_at: Instant,
}

#[derive(Debug, Deserialize)]
struct ToolLuResponse {
    #[serde(default)]
    status: serde_json::Value,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    text: Option<ToolLuText>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolLuText {
    #[serde(default)]
    mobile: Option<String>,
    #[serde(default)]
    province: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    corp: Option<String>,
    #[serde(default)]
    card_type: Option<String>,
    #[serde(default)]
    area_code: Option<String>,
    #[serde(default)]
    post_code: Option<String>,
}

/// Map tool.lu's short carrier names onto the canonical ones
///
/// Names that already carry the `中国` prefix pass through; unknown names
/// map to `其他`.
pub fn normalize_carrier(corp: &str) -> String {
    let corp = corp.trim();
    if corp.starts_with("中国") {
        return corp.to_string();
    }

    let canonical = if corp.contains("移动") {
        CARRIER_MOBILE
    } else if corp.contains("联通") {
        CARRIER_UNICOM
    } else if corp.contains("电信") {
        CARRIER_TELECOM
    } else if corp.contains("广电") {
        CARRIER_BROADNET
    } else {
        CARRIER_OTHER
    };
    canonical.to_string()
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_i64() == Some(1),
        serde_json::Value::String(s) => matches!(s.as_str(), "1" | "true" | "ok" | "success"),
        _ => false,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Carrier lookup through tool.lu
pub struct ToolLuProvider {
    transport: Arc<dyn HttpTransport>,
    config: ToolLuConfig,
    session: RwLock<Option<Session>>,
    cache: TtlCache<PhoneResult>,
    throttle: RequestThrottle,
}

impl ToolLuProvider {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_config(transport, ToolLuConfig::default())
    }

    pub fn with_config(transport: Arc<dyn HttpTransport>, config: ToolLuConfig) -> Self {
        Self {
            cache: TtlCache::new(config.cache_ttl),
            throttle: RequestThrottle::new(config.min_interval),
            session: RwLock::new(None),
            transport,
            config,
        }
    }

    fn transport_error(&self, err: InfrastructureError) -> LookupError {
        match err {
            InfrastructureError::Timeout(_) => LookupError::Timeout {
                provider: TOOLLU_PROVIDER_NAME.to_string(),
                seconds: self.config.timeout.as_secs(),
            },
            other => LookupError::network(TOOLLU_PROVIDER_NAME, other),
        }
    }

    /// Cookie of the current session, fetching a new one when it expired
    async fn session_cookie(&self) -> Result<Option<String>, LookupError> {
        if let Some(session) = self.session.read().await.as_ref() {
            if session.obtained_at.elapsed() < self.config.session_ttl {
                return Ok(session.cookie.clone());
            }
        }

        self.throttle.acquire().await;
        let request = HttpRequest::get(self.config.home_url()).timeout(self.config.timeout);
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.is_success() {
            return Err(LookupError::upstream(
                TOOLLU_PROVIDER_NAME,
                format!("homepage returned HTTP {}", response.status),
            ));
        }

        let cookie = response.cookie_header();
        if cookie.is_none() {
            warn!("tool.lu homepage set no session cookie");
        }
        debug!("tool.lu session cookie refreshed");

        *self.session.write().await = Some(Session {
            cookie: cookie.clone(),
            obtained_at: Instant::now(),
        });
        Ok(cookie)
    }

    async fn invalidate_session(&self) {
        *self.session.write().await = None;
    }

    /// One query attempt for an already-validated number
    async fn query(&self, number: &str) -> Result<PhoneInfo, LookupError> {
        let cookie = self.session_cookie().await?;

        self.throttle.acquire().await;
        let mut request = HttpRequest::post_form(
            self.config.query_url(),
            [("mobile", number), ("operate", "query")],
        )
        .header("Referer", self.config.home_url())
        .header("X-Requested-With", "XMLHttpRequest")
        .timeout(self.config.timeout);
        if let Some(cookie) = cookie {
            request = request.header("Cookie", cookie);
        }

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status == 403 {
            self.invalidate_session().await;
            return Err(LookupError::upstream(
                TOOLLU_PROVIDER_NAME,
                "HTTP 403, session rejected",
            ));
        }
        if !response.is_success() {
            return Err(LookupError::upstream(
                TOOLLU_PROVIDER_NAME,
                format!("HTTP {}", response.status),
            ));
        }

        let body: ToolLuResponse = response.json().map_err(|e| {
            LookupError::upstream(TOOLLU_PROVIDER_NAME, format!("malformed response: {}", e))
        })?;
        Self::parse(number, body)
    }

    fn parse(number: &str, body: ToolLuResponse) -> Result<PhoneInfo, LookupError> {
        if !is_truthy(&body.status) {
            let message = non_empty(body.message).unwrap_or_else(|| "query rejected".to_string());
            return Err(LookupError::upstream(TOOLLU_PROVIDER_NAME, message));
        }

        let text = body.text.ok_or_else(|| {
            LookupError::upstream(TOOLLU_PROVIDER_NAME, "malformed response: missing text")
        })?;
        let corp = non_empty(text.corp).ok_or_else(|| {
            LookupError::upstream(TOOLLU_PROVIDER_NAME, "malformed response: missing carrier")
        })?;

        let phone_number = non_empty(text.mobile).unwrap_or_else(|| number.to_string());
        let province = non_empty(text.province).unwrap_or_else(|| UNKNOWN_REGION.to_string());
        let city = non_empty(text.city).unwrap_or_else(|| province.clone());

        let mut note = Vec::new();
        if let Some(card_type) = non_empty(text.card_type) {
            note.push(format!("卡类型: {}", card_type));
        }
        if let Some(area_code) = non_empty(text.area_code) {
            note.push(format!("区号: {}", area_code));
        }
        if let Some(post_code) = non_empty(text.post_code) {
            note.push(format!("邮编: {}", post_code));
        }

        Ok(PhoneInfo::new(phone_number, normalize_carrier(&corp), province, city).with_note(note.join(", ")))
    }
}

#[async_trait]
impl PhoneProvider for ToolLuProvider {
    fn name(&self) -> &str {
        TOOLLU_PROVIDER_NAME
    }

    fn priority(&self) -> u8 {
        2
    }

    async fn lookup(&self, phone: &str) -> PhoneResult {
        let Some(number) = to_mainland_mobile(phone) else {
            return PhoneResult::failure(LookupError::invalid_phone(phone), Some(TOOLLU_PROVIDER_NAME));
        };

        if let Some(hit) = self.cache.get(&number).await {
            debug!(phone = %mask_phone_number(&number), "tool.lu cache hit");
            return hit.as_cached();
        }

        let number = number.as_str();
        let outcome = self
            .config
            .retry
            .run_if(
                |attempt| async move {
                    debug!(phone = %mask_phone_number(number), attempt, "tool.lu query");
                    self.query(number).await
                },
                LookupError::is_retryable,
            )
            .await;

        match outcome {
            Ok(info) => {
                info!(phone = %mask_phone_number(number), carrier = %info.carrier, "tool.lu lookup succeeded");
                let result = PhoneResult::success(info, TOOLLU_PROVIDER_NAME);
                self.cache.insert(number, result.clone()).await;
                result
            }
            Err(e) => {
                warn!(phone = %mask_phone_number(number), error = %e, "tool.lu lookup failed");
                PhoneResult::failure(e, Some(TOOLLU_PROVIDER_NAME))
            }
        }
    }

    async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}
