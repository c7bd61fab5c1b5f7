//! Mock implementation of SmsRecordRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::{SmsRecord, SmsStatus, StatusUpdate};
use crate::errors::DomainError;

use super::r#trait::SmsRecordRepository;

/// Mock SMS record repository for testing
pub struct MockSmsRecordRepository {
    records: Arc<RwLock<HashMap<String, SmsRecord>>>,
    fail_reads: AtomicBool,
}

impl MockSmsRecordRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Seed a record
    pub async fn insert(&self, record: SmsRecord) {
        self.records
            .write()
            .await
            .insert(record.out_id.clone(), record);
    }

    /// Current state of a record
    pub async fn get(&self, out_id: &str) -> Option<SmsRecord> {
        self.records.read().await.get(out_id).cloned()
    }

    /// Make `find_pending` and `find_by_out_id` fail
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), DomainError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DomainError::Internal {
                message: "Database unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MockSmsRecordRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SmsRecordRepository for MockSmsRecordRepository {
    async fn find_pending(&self, max_retry: u32) -> Result<Vec<SmsRecord>, DomainError> {
        self.check_reads()?;
        let records = self.records.read().await;
        let mut pending: Vec<SmsRecord> = records
            .values()
            .filter(|r| r.status == SmsStatus::Sending && r.retry_count < max_retry)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.out_id.cmp(&b.out_id)));
        Ok(pending)
    }

    async fn find_by_out_id(&self, out_id: &str) -> Result<Option<SmsRecord>, DomainError> {
        self.check_reads()?;
        Ok(self.records.read().await.get(out_id).cloned())
    }

    async fn record_retry(
        &self,
        out_id: &str,
        retry_count: u32,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        match records.get_mut(out_id) {
            Some(record) => {
                record.retry_count = retry_count;
                record.last_retry_at = Some(at);
                record.updated_at = Utc::now();
                Ok(())
            }
            None => Err(DomainError::NotFound {
                resource: format!("sms_record {}", out_id),
            }),
        }
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(&update.out_id) else {
            return Ok(false);
        };

        record.status = update.status;
        if update.error_code.is_some() {
            record.error_code = update.error_code.clone();
        }
        if update.receive_date.is_some() {
            record.receive_date = update.receive_date.clone();
        }
        record.updated_at = Utc::now();
        Ok(true)
    }
}
