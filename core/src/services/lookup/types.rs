//! Types reported by the lookup service

use serde::{Deserialize, Serialize};

/// Snapshot of one registered provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub name: String,
    pub priority: u8,
    pub supports_batch: bool,
    pub available: bool,
}
