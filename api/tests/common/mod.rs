//! Shared fixtures for the API integration tests

#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sd_api::routes::AppState;
use sd_shared::config::Environment;
use sd_core::domain::entities::{DeliveryReport, SmsRecord, StatusUpdate};
use sd_core::errors::DomainError;
use sd_core::repositories::SmsRecordRepository;
use sd_core::services::lookup::{LookupServiceConfig, OfflineProvider, PhoneLookupService, PhoneProvider};
use sd_core::services::monitor::{BackgroundSmsMonitor, MonitorConfig, SmsStatusClient};

// In-memory sms_records table
#[derive(Default)]
pub struct MemoryRecords {
    records: Mutex<HashMap<String, SmsRecord>>,
}

impl MemoryRecords {
    pub fn insert(&self, record: SmsRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.out_id.clone(), record);
    }

    pub fn get(&self, out_id: &str) -> Option<SmsRecord> {
        self.records.lock().unwrap().get(out_id).cloned()
    }
}

#[async_trait]
impl SmsRecordRepository for MemoryRecords {
    async fn find_pending(&self, max_retry: u32) -> Result<Vec<SmsRecord>, DomainError> {
        let mut pending: Vec<SmsRecord> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.status == sd_core::domain::entities::SmsStatus::Sending)
            .filter(|r| r.retry_count < max_retry)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        Ok(pending)
    }

    async fn find_by_out_id(&self, out_id: &str) -> Result<Option<SmsRecord>, DomainError> {
        Ok(self.get(out_id))
    }

    async fn record_retry(
        &self,
        out_id: &str,
        retry_count: u32,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(out_id).ok_or_else(|| DomainError::NotFound {
            resource: out_id.to_string(),
        })?;
        record.retry_count = retry_count;
        record.last_retry_at = Some(at);
        Ok(())
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<bool, DomainError> {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&update.out_id) {
            Some(record) => {
                record.status = update.status;
                record.error_code = update.error_code.clone().or(record.error_code.take());
                record.receive_date = update.receive_date.clone().or(record.receive_date.take());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// Status API answering from a fixed table, pending otherwise
#[derive(Default)]
pub struct FixedStatusApi {
    reports: Mutex<HashMap<String, DeliveryReport>>,
}

impl FixedStatusApi {
    pub fn set(&self, out_id: &str, report: DeliveryReport) {
        self.reports
            .lock()
            .unwrap()
            .insert(out_id.to_string(), report);
    }
}

#[async_trait]
impl SmsStatusClient for FixedStatusApi {
    async fn query_status(
        &self,
        out_id: &str,
        _phone_number: &str,
    ) -> Result<DeliveryReport, DomainError> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .get(out_id)
            .cloned()
            .unwrap_or(DeliveryReport::Pending))
    }
}

pub type TestState = AppState<MemoryRecords, FixedStatusApi>;

pub struct Fixture {
    pub records: Arc<MemoryRecords>,
    pub status_api: Arc<FixedStatusApi>,
    pub state: web::Data<TestState>,
}

/// Offline-only lookup and a monitor over in-memory fakes
pub fn fixture() -> Fixture {
    fixture_for(Environment::Development)
}

pub fn fixture_for(environment: Environment) -> Fixture {
    let lookup = Arc::new(PhoneLookupService::new(
        vec![Arc::new(OfflineProvider::new()) as Arc<dyn PhoneProvider>],
        LookupServiceConfig::default(),
    ));
    let records = Arc::new(MemoryRecords::default());
    let status_api = Arc::new(FixedStatusApi::default());
    let monitor = Arc::new(BackgroundSmsMonitor::new(
        records.clone(),
        status_api.clone(),
        MonitorConfig::default(),
    ));

    Fixture {
        records,
        status_api,
        state: web::Data::new(AppState::new(lookup, monitor).with_environment(environment)),
    }
}
