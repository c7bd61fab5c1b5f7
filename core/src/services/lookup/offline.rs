//! Offline carrier lookup from the number-segment table

use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;

use sd_shared::phone::{mask_phone_number, to_mainland_mobile};

use crate::domain::entities::{
    PhoneInfo, PhoneResult, CARRIER_MOBILE, CARRIER_OTHER, CARRIER_TELECOM, CARRIER_UNICOM,
    UNKNOWN_REGION,
};
use crate::errors::LookupError;

use super::traits::PhoneProvider;

pub const OFFLINE_PROVIDER_NAME: &str = "offline";

const MOBILE_PREFIXES: &[&str] = &[
    "134", "135", "136", "137", "138", "139", "147", "148", "150", "151", "152", "157", "158",
    "159", "172", "178", "182", "183", "184", "187", "188", "195", "197", "198",
];

const UNICOM_PREFIXES: &[&str] = &[
    "130", "131", "132", "145", "146", "155", "156", "166", "167", "171", "175", "176", "185",
    "186", "196",
];

const TELECOM_PREFIXES: &[&str] = &[
    "133", "149", "153", "173", "174", "177", "180", "181", "189", "190", "191", "193", "199",
];

static PREFIX_TABLE: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut table = HashMap::new();
    for (prefixes, carrier) in [
        (MOBILE_PREFIXES, CARRIER_MOBILE),
        (UNICOM_PREFIXES, CARRIER_UNICOM),
        (TELECOM_PREFIXES, CARRIER_TELECOM),
    ] {
        for prefix in prefixes {
            table.insert(*prefix, carrier);
        }
    }
    table
});

/// Carrier owning a 3-digit segment, `其他` when unmapped
pub fn carrier_for_prefix(prefix: &str) -> &'static str {
    PREFIX_TABLE.get(prefix).copied().unwrap_or(CARRIER_OTHER)
}

/// Last-resort provider: identifies the carrier from the number segment
/// only. Never touches the network and is always available.
#[derive(Debug, Default, Clone)]
pub struct OfflineProvider;

impl OfflineProvider {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous lookup used by the async trait method
    pub fn resolve(&self, phone: &str) -> PhoneResult {
        let Some(number) = to_mainland_mobile(phone) else {
            return PhoneResult::failure(
                LookupError::invalid_phone(phone),
                Some(OFFLINE_PROVIDER_NAME),
            );
        };

        let carrier = carrier_for_prefix(&number[0..3]);
        debug!(phone = %mask_phone_number(&number), carrier, "Offline carrier lookup");

        let info = PhoneInfo::new(number, carrier, UNKNOWN_REGION, UNKNOWN_REGION)
            .with_note("离线号段识别，仅包含运营商信息");
        PhoneResult::success(info, OFFLINE_PROVIDER_NAME)
    }
}

#[async_trait]
impl PhoneProvider for OfflineProvider {
    fn name(&self) -> &str {
        OFFLINE_PROVIDER_NAME
    }

    fn priority(&self) -> u8 {
        9
    }

    async fn lookup(&self, phone: &str) -> PhoneResult {
        self.resolve(phone)
    }
}
