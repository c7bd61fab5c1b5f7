//! Integration tests for the background SMS monitor over the public API

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::RwLock;

    use sd_core::domain::entities::{DeliveryReport, SmsRecord, SmsStatus, StatusUpdate};
    use sd_core::errors::DomainError;
    use sd_core::repositories::SmsRecordRepository;
    use sd_core::services::monitor::{BackgroundSmsMonitor, MonitorConfig, SmsStatusClient};

    #[derive(Default)]
    struct InMemoryRepository {
        records: RwLock<HashMap<String, SmsRecord>>,
    }

    #[async_trait]
    impl SmsRecordRepository for InMemoryRepository {
        async fn find_pending(&self, max_retry: u32) -> Result<Vec<SmsRecord>, DomainError> {
            let records = self.records.read().await;
            let mut pending: Vec<_> = records
                .values()
                .filter(|r| r.status == SmsStatus::Sending && r.retry_count < max_retry)
                .cloned()
                .collect();
            pending.sort_by(|a, b| a.out_id.cmp(&b.out_id));
            Ok(pending)
        }

        async fn find_by_out_id(&self, out_id: &str) -> Result<Option<SmsRecord>, DomainError> {
            Ok(self.records.read().await.get(out_id).cloned())
        }

        async fn record_retry(&self, out_id: &str, retry_count: u32, at: DateTime<Utc>) -> Result<(), DomainError> {
            if let Some(record) = self.records.write().await.get_mut(out_id) {
                record.retry_count = retry_count;
                record.last_retry_at = Some(at);
            }
            Ok(())
        }

        async fn update_status(&self, update: &StatusUpdate) -> Result<bool, DomainError> {
            match self.records.write().await.get_mut(&update.out_id) {
                Some(record) => {
                    record.status = update.status;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    // Never answers with a final status
    struct SilentStatusClient;

    #[async_trait]
    impl SmsStatusClient for SilentStatusClient {
        async fn query_status(&self, _out_id: &str, _phone: &str) -> Result<DeliveryReport, DomainError> {
            Ok(DeliveryReport::Pending)
        }
    }

    #[tokio::test]
    async fn test_message_is_stopped_after_max_retries() {
        let repository = Arc::new(InMemoryRepository::default());
        repository
            .records
            .write()
            .await
            .insert("msg-1".to_string(), SmsRecord::sending("msg-1", "13800138000"));

        let config = MonitorConfig {
            pacing_delay: Duration::ZERO,
            max_retry_count: 3,
            backoff: sd_core::services::retry::Backoff::Fixed(Duration::ZERO),
            ..MonitorConfig::default()
        };
        let monitor = BackgroundSmsMonitor::new(repository.clone(), Arc::new(SilentStatusClient), config);

        for _ in 0..5 {
            monitor.poll_once().await;
        }

        let record = repository.find_by_out_id("msg-1").await.unwrap().unwrap();
        assert_eq!(record.status, SmsStatus::Stopped);
        assert_eq!(record.retry_count, 3);
        assert_eq!(monitor.status().await.queue_length, 0);
    }

    #[tokio::test]
    async fn test_status_snapshot_serializes() {
        let repository = Arc::new(InMemoryRepository::default());
        let monitor = Arc::new(BackgroundSmsMonitor::new(
            repository,
            Arc::new(SilentStatusClient),
            MonitorConfig::default(),
        ));

        let json = serde_json::to_value(monitor.status().await).unwrap();
        assert_eq!(json["running"], false);
        assert_eq!(json["queueLength"], 0);
        assert!(json["tasks"].as_array().unwrap().is_empty());
    }
}
