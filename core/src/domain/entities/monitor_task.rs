//! In-memory task tracked by the background SMS monitor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::retry::Backoff;

use super::sms_record::SmsRecord;

/// One SMS waiting for a delivery receipt
///
/// Tasks only live in the monitor's queue; the queue is rebuilt from
/// `sms_records` on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundSmsTask {
    pub out_id: String,
    pub phone_number: String,
    pub retry_count: u32,
    pub last_retry_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl BackgroundSmsTask {
    /// Fresh task that has never been polled
    pub fn new(out_id: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            out_id: out_id.into(),
            phone_number: phone_number.into(),
            retry_count: 0,
            last_retry_at: None,
            created_at: Utc::now(),
        }
    }

    /// Earliest instant at which the task may be polled again
    pub fn next_eligible_at(&self, backoff: &Backoff) -> Option<DateTime<Utc>> {
        let last = self.last_retry_at?;
        let wait = chrono::Duration::from_std(backoff.delay(self.retry_count))
            .unwrap_or_else(|_| chrono::Duration::max_value());
        Some(last.checked_add_signed(wait).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    /// Whether the backoff window since the last poll has elapsed
    pub fn is_eligible(&self, now: DateTime<Utc>, backoff: &Backoff) -> bool {
        match self.next_eligible_at(backoff) {
            Some(at) => now >= at,
            None => true,
        }
    }
}

impl From<&SmsRecord> for BackgroundSmsTask {
    fn from(record: &SmsRecord) -> Self {
        Self {
            out_id: record.out_id.clone(),
            phone_number: record.phone_number.clone(),
            retry_count: record.retry_count,
            last_retry_at: record.last_retry_at,
            created_at: record.created_at,
        }
    }
}
