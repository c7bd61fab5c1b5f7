use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Most numbers accepted by one batch request
pub const MAX_BATCH_PHONES: usize = 500;

/// Query string of `GET /api/phone-lookup`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PhoneQuery {
    /// Mobile number in any common spelling, e.g. "13800138000" or "+86 138-0013-8000"
    #[validate(length(min = 1, max = 32))]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchLookupRequest {
    #[validate(length(min = 1, max = 500))]
    pub phones: Vec<String>,
}

/// Provider name to token; an empty token clears it
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetTokensRequest {
    #[validate(length(min = 1))]
    pub tokens: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTokensResponse {
    pub applied: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearCacheResponse {
    /// Entries held by the orchestrator cache before clearing
    pub cleared_entries: usize,
}
