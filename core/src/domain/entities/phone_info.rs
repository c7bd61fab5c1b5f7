//! Carrier lookup value objects.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// China Mobile
pub const CARRIER_MOBILE: &str = "中国移动";

/// China Unicom
pub const CARRIER_UNICOM: &str = "中国联通";

/// China Telecom
pub const CARRIER_TELECOM: &str = "中国电信";

/// China Broadnet
pub const CARRIER_BROADNET: &str = "中国广电";

/// Carrier could not be determined
pub const CARRIER_OTHER: &str = "其他";

/// Placeholder for an unknown province or city
pub const UNKNOWN_REGION: &str = "未知";

/// Carrier and region of one mobile number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneInfo {
    /// The 11-digit mobile number
    pub phone_number: String,

    /// Normalized carrier name (e.g. 中国移动)
    pub carrier: String,

    /// Province of registration
    pub province: String,

    /// City of registration
    pub city: String,

    /// Free-form provider note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PhoneInfo {
    /// Create a new phone info value
    pub fn new(
        phone_number: impl Into<String>,
        carrier: impl Into<String>,
        province: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            phone_number: phone_number.into(),
            carrier: carrier.into(),
            province: province.into(),
            city: city.into(),
            note: None,
        }
    }

    /// Attach a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.note = if note.is_empty() { None } else { Some(note) };
        self
    }
}

/// Outcome of a single lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PhoneInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Name of the provider that produced this result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl PhoneResult {
    /// Successful lookup
    pub fn success(data: PhoneInfo, provider: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            provider: Some(provider.into()),
        }
    }

    /// Failed lookup
    pub fn failure(error: impl ToString, provider: Option<&str>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            provider: provider.map(str::to_string),
        }
    }

    /// Copy of this result re-tagged as served from a cache
    pub fn as_cached(&self) -> Self {
        let mut cached = self.clone();
        let name = self.provider.as_deref().unwrap_or("unknown");
        cached.provider = Some(if name.ends_with("(cached)") {
            name.to_string()
        } else {
            format!("{}(cached)", name)
        });
        cached
    }
}

/// Outcome of a batch lookup, keyed by requested phone number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPhoneResult {
    /// True when at least one number resolved
    pub success: bool,
    pub results: HashMap<String, PhoneResult>,
    pub total_count: usize,
    pub success_count: usize,
    pub failure_count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl BatchPhoneResult {
    /// Build a batch result, deriving the counters from `results`
    pub fn from_results(results: HashMap<String, PhoneResult>, provider: Option<String>) -> Self {
        let success_count = results.values().filter(|r| r.success).count();
        let total_count = results.len();

        Self {
            success: success_count > 0,
            failure_count: total_count - success_count,
            success_count,
            total_count,
            results,
            provider,
        }
    }
}
