//! SMS record repository trait defining the interface for `sms_records` persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{SmsRecord, StatusUpdate};
use crate::errors::DomainError;

/// Repository trait for the delivery-status side of `sms_records`
///
/// The table is the monitor's source of truth: the in-memory queue is rebuilt
/// from [`SmsRecordRepository::find_pending`] on every poll tick, and every
/// poll outcome is written back before the next one.
#[async_trait]
pub trait SmsRecordRepository: Send + Sync {
    /// Records still in the sending state with `retry_count < max_retry`
    ///
    /// # Returns
    /// * `Ok(Vec<SmsRecord>)` - Matching records, oldest first
    /// * `Err(DomainError)` - Database error occurred
    async fn find_pending(&self, max_retry: u32) -> Result<Vec<SmsRecord>, DomainError>;

    /// Find a record by its provider-side message id
    ///
    /// # Returns
    /// * `Ok(Some(SmsRecord))` - Record found
    /// * `Ok(None)` - No record with this id
    /// * `Err(DomainError)` - Database error occurred
    async fn find_by_out_id(&self, out_id: &str) -> Result<Option<SmsRecord>, DomainError>;

    /// Persist the retry counter and timestamp of the last poll
    async fn record_retry(
        &self,
        out_id: &str,
        retry_count: u32,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Persist a status change
    ///
    /// # Returns
    /// * `Ok(true)` - The record was updated
    /// * `Ok(false)` - No record with this id
    /// * `Err(DomainError)` - Database error occurred
    async fn update_status(&self, update: &StatusUpdate) -> Result<bool, DomainError>;
}
