//! Unit tests for the background SMS monitor

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;

use super::mocks::MockStatusClient;
use crate::domain::entities::{DeliveryReport, SmsRecord, SmsStatus};
use crate::errors::DomainError;
use crate::repositories::MockSmsRecordRepository;
use crate::services::monitor::{BackgroundSmsMonitor, MonitorConfig, TaskOutcome};

type Monitor = BackgroundSmsMonitor<MockSmsRecordRepository, MockStatusClient>;

struct Fixture {
    monitor: Arc<Monitor>,
    repository: Arc<MockSmsRecordRepository>,
    client: Arc<MockStatusClient>,
}

fn unpaced() -> MonitorConfig {
    MonitorConfig {
        pacing_delay: Duration::ZERO,
        ..MonitorConfig::default()
    }
}

async fn fixture(records: Vec<SmsRecord>, client: MockStatusClient, config: MonitorConfig) -> Fixture {
    let repository = Arc::new(MockSmsRecordRepository::new());
    for record in records {
        repository.insert(record).await;
    }
    let client = Arc::new(client);
    let monitor = Arc::new(BackgroundSmsMonitor::new(
        repository.clone(),
        client.clone(),
        config,
    ));
    Fixture {
        monitor,
        repository,
        client,
    }
}

fn record(out_id: &str) -> SmsRecord {
    SmsRecord::sending(out_id, "13800138000")
}

#[tokio::test]
async fn test_delivered_report_is_persisted() {
    let client = MockStatusClient::new();
    client.respond(
        "msg-1",
        Ok(DeliveryReport::Delivered {
            receive_date: Some("2024-05-01 10:00:00".to_string()),
        }),
    );
    let f = fixture(vec![record("msg-1")], client, unpaced()).await;

    let report = f.monitor.poll_once().await;

    assert!(!report.skipped);
    assert_eq!(report.processed.len(), 1);
    assert_eq!(report.processed[0].outcome, TaskOutcome::Delivered);
    assert_eq!(report.queue_length, 0);

    let stored = f.repository.get("msg-1").await.unwrap();
    assert_eq!(stored.status, SmsStatus::Delivered);
    assert_eq!(stored.receive_date.as_deref(), Some("2024-05-01 10:00:00"));
    assert_eq!(stored.retry_count, 0);
}

#[tokio::test]
async fn test_failed_report_is_persisted() {
    let client = MockStatusClient::new();
    client.respond(
        "msg-1",
        Ok(DeliveryReport::Failed {
            error_code: Some("MK:0001".to_string()),
        }),
    );
    let f = fixture(vec![record("msg-1")], client, unpaced()).await;

    let report = f.monitor.poll_once().await;

    assert_eq!(report.processed[0].outcome, TaskOutcome::Failed);
    let stored = f.repository.get("msg-1").await.unwrap();
    assert_eq!(stored.status, SmsStatus::Failed);
    assert_eq!(stored.error_code.as_deref(), Some("MK:0001"));
}

#[tokio::test]
async fn test_pending_report_backs_off() {
    let f = fixture(vec![record("msg-1")], MockStatusClient::new(), unpaced()).await;

    let first = f.monitor.poll_once().await;
    assert_eq!(
        first.processed[0].outcome,
        TaskOutcome::Retrying { retry_count: 1 }
    );
    assert_eq!(first.queue_length, 1);

    let stored = f.repository.get("msg-1").await.unwrap();
    assert_eq!(stored.status, SmsStatus::Sending);
    assert_eq!(stored.retry_count, 1);
    assert!(stored.last_retry_at.is_some());

    // second tick falls inside the 2 minute backoff window
    let second = f.monitor.poll_once().await;
    assert!(second.processed.is_empty());
    assert_eq!(f.client.call_count(), 1);
}

#[tokio::test]
async fn test_query_error_counts_as_retry() {
    let client = MockStatusClient::new();
    client.respond("msg-1", Err("connection refused".to_string()));
    let f = fixture(vec![record("msg-1")], client, unpaced()).await;

    let report = f.monitor.poll_once().await;

    assert_eq!(
        report.processed[0].outcome,
        TaskOutcome::Retrying { retry_count: 1 }
    );
    assert_eq!(f.repository.get("msg-1").await.unwrap().retry_count, 1);
}

#[tokio::test]
async fn test_retry_ceiling_stops_polling() {
    let mut near_ceiling = record("msg-1");
    near_ceiling.retry_count = 14;
    let f = fixture(vec![near_ceiling], MockStatusClient::new(), unpaced()).await;

    let report = f.monitor.poll_once().await;

    assert_eq!(report.processed[0].outcome, TaskOutcome::Stopped);
    assert_eq!(report.queue_length, 0);
    let stored = f.repository.get("msg-1").await.unwrap();
    assert_eq!(stored.status, SmsStatus::Stopped);
    assert_eq!(stored.status.as_str(), "发送中(已停止查询)");
    assert_eq!(stored.retry_count, 15);

    // never selected again
    let report = f.monitor.poll_once().await;
    assert!(report.processed.is_empty());
    assert_eq!(f.client.call_count(), 1);
}

#[tokio::test]
async fn test_records_at_ceiling_are_not_loaded() {
    let mut exhausted = record("msg-1");
    exhausted.retry_count = 15;
    let f = fixture(vec![exhausted], MockStatusClient::new(), unpaced()).await;

    let report = f.monitor.poll_once().await;

    assert_eq!(report.queue_length, 0);
    assert_eq!(f.client.call_count(), 0);
}

#[tokio::test]
async fn test_eligibility_follows_exponential_backoff() {
    let mut recent = record("recent");
    recent.retry_count = 3;
    recent.last_retry_at = Some(Utc::now() - ChronoDuration::seconds(1));

    let mut due = record("due");
    due.retry_count = 3;
    due.last_retry_at = Some(Utc::now() - ChronoDuration::minutes(10));

    let mut capped = record("capped");
    capped.retry_count = 12;
    capped.last_retry_at = Some(Utc::now() - ChronoDuration::minutes(10));

    let f = fixture(vec![recent, due, capped], MockStatusClient::new(), unpaced()).await;

    f.monitor.poll_once().await;

    assert_eq!(f.client.calls_for("recent"), 0);
    assert_eq!(f.client.calls_for("due"), 1);
    assert_eq!(f.client.calls_for("capped"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_tick_processes_one_batch_with_pacing() {
    let records = (0..12).map(|i| record(&format!("msg-{:02}", i))).collect();
    let f = fixture(records, MockStatusClient::new(), MonitorConfig::default()).await;
    let started = tokio::time::Instant::now();

    let report = f.monitor.poll_once().await;

    assert_eq!(report.processed.len(), 10);
    assert_eq!(f.client.call_count(), 10);
    assert_eq!(report.queue_length, 12);
    // 1 second between each of the 10 queries
    assert!(started.elapsed() >= Duration::from_secs(9));
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_tick_is_skipped() {
    let client = MockStatusClient::new().with_delay(Duration::from_secs(5));
    let f = fixture(vec![record("msg-1")], client, unpaced()).await;

    let monitor = f.monitor.clone();
    let first = tokio::spawn(async move { monitor.poll_once().await });
    tokio::task::yield_now().await;

    assert!(f.monitor.status().await.processing);
    let second = f.monitor.poll_once().await;
    assert!(second.skipped);

    let first = first.await.unwrap();
    assert!(!first.skipped);
    assert!(!f.monitor.status().await.processing);
    assert_eq!(f.client.call_count(), 1);
}

#[tokio::test]
async fn test_failed_refresh_keeps_current_queue() {
    let f = fixture(vec![record("msg-1")], MockStatusClient::new(), unpaced()).await;
    assert!(f.monitor.add_sms_for_monitoring("msg-1", "13800138000").await.unwrap());
    f.monitor.stop().await;

    f.repository.set_fail_reads(true);
    let report = f.monitor.poll_once().await;

    assert_eq!(report.processed.len(), 1);
    assert_eq!(f.client.calls_for("msg-1"), 1);
}

#[tokio::test]
async fn test_refresh_drops_tasks_missing_from_database() {
    let f = fixture(vec![record("msg-1")], MockStatusClient::new(), unpaced()).await;
    assert!(f.monitor.add_sms_for_monitoring("msg-2", "13900001111").await.unwrap());

    // msg-2 has no row, so the refresh inside start dropped it
    let status = f.monitor.status().await;
    let ids: Vec<_> = status.tasks.iter().map(|t| t.out_id.as_str()).collect();
    assert_eq!(ids, ["msg-1"]);
    f.monitor.stop().await;
}

#[tokio::test]
async fn test_start_without_pending_records_stays_stopped() {
    let f = fixture(Vec::new(), MockStatusClient::new(), unpaced()).await;

    assert!(!f.monitor.start().await.unwrap());
    assert!(!f.monitor.is_running());
    assert!(!f.monitor.stop().await);
}

#[tokio::test]
async fn test_start_with_only_backing_off_records_stays_stopped() {
    let mut waiting = record("msg-1");
    waiting.retry_count = 2;
    waiting.last_retry_at = Some(Utc::now() - ChronoDuration::seconds(10));
    let f = fixture(vec![waiting], MockStatusClient::new(), unpaced()).await;

    assert!(!f.monitor.start().await.unwrap());
    assert!(!f.monitor.is_running());
    assert_eq!(f.client.call_count(), 0);

    // a due record alongside it is enough to start
    f.repository.insert(record("msg-2")).await;
    assert!(f.monitor.start().await.unwrap());
    assert_eq!(f.monitor.status().await.queue_length, 2);
    assert!(f.monitor.stop().await);
}

#[tokio::test]
async fn test_start_reports_database_errors() {
    let f = fixture(vec![record("msg-1")], MockStatusClient::new(), unpaced()).await;
    f.repository.set_fail_reads(true);

    assert!(f.monitor.start().await.is_err());
    assert!(!f.monitor.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_comes_after_one_interval() {
    let f = fixture(vec![record("msg-1")], MockStatusClient::new(), unpaced()).await;

    assert!(f.monitor.start().await.unwrap());
    assert!(f.monitor.is_running());
    // idempotent while running
    assert!(f.monitor.start().await.unwrap());

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(f.client.call_count(), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(f.client.call_count(), 1);
    assert!(f.monitor.is_running());

    assert!(f.monitor.stop().await);
    assert!(!f.monitor.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_monitor_stops_when_queue_drains() {
    let client = MockStatusClient::new();
    client.respond("msg-1", Ok(DeliveryReport::Delivered { receive_date: None }));
    let f = fixture(vec![record("msg-1")], client, unpaced()).await;

    assert!(f.monitor.start().await.unwrap());
    tokio::time::sleep(Duration::from_secs(31)).await;

    assert!(!f.monitor.is_running());
    assert_eq!(
        f.repository.get("msg-1").await.unwrap().status,
        SmsStatus::Delivered
    );
}

#[tokio::test(start_paused = true)]
async fn test_add_is_idempotent_and_restarts_monitor() {
    let client = MockStatusClient::new();
    client.respond("msg-1", Ok(DeliveryReport::Delivered { receive_date: None }));
    let f = fixture(Vec::new(), client, unpaced()).await;

    f.repository.insert(record("msg-1")).await;
    assert!(f.monitor.add_sms_for_monitoring("msg-1", "13800138000").await.unwrap());
    assert!(f.monitor.is_running());
    assert!(!f.monitor.add_sms_for_monitoring("msg-1", "13800138000").await.unwrap());
    assert_eq!(f.monitor.status().await.queue_length, 1);

    // drain, then a new message brings the loop back
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(!f.monitor.is_running());

    f.repository.insert(record("msg-2")).await;
    assert!(f.monitor.add_sms_for_monitoring("msg-2", "13800138000").await.unwrap());
    assert!(f.monitor.is_running());
    assert!(f.monitor.stop().await);
}

#[tokio::test]
async fn test_recheck_resolves_stopped_record() {
    let mut stopped = record("msg-1");
    stopped.status = SmsStatus::Stopped;
    stopped.retry_count = 15;
    let client = MockStatusClient::new();
    client.respond("msg-1", Ok(DeliveryReport::Delivered { receive_date: None }));
    let f = fixture(vec![stopped], client, unpaced()).await;

    let updated = f.monitor.recheck("msg-1").await.unwrap();

    assert_eq!(updated.status, SmsStatus::Delivered);
    assert_eq!(f.client.call_count(), 1);
}

#[tokio::test]
async fn test_recheck_ignores_backoff_window() {
    let mut waiting = record("msg-1");
    waiting.retry_count = 5;
    waiting.last_retry_at = Some(Utc::now());
    let client = MockStatusClient::new();
    client.respond("msg-1", Ok(DeliveryReport::Failed { error_code: None }));
    let f = fixture(vec![waiting], client, unpaced()).await;

    let updated = f.monitor.recheck("msg-1").await.unwrap();

    assert_eq!(updated.status, SmsStatus::Failed);
}

#[tokio::test]
async fn test_recheck_pending_leaves_record_unchanged() {
    let mut stopped = record("msg-1");
    stopped.status = SmsStatus::Stopped;
    let f = fixture(vec![stopped.clone()], MockStatusClient::new(), unpaced()).await;

    let result = f.monitor.recheck("msg-1").await.unwrap();

    assert_eq!(result, stopped);
}

#[tokio::test]
async fn test_recheck_final_record_skips_query() {
    let mut delivered = record("msg-1");
    delivered.status = SmsStatus::Delivered;
    let f = fixture(vec![delivered], MockStatusClient::new(), unpaced()).await;

    let result = f.monitor.recheck("msg-1").await.unwrap();

    assert_eq!(result.status, SmsStatus::Delivered);
    assert_eq!(f.client.call_count(), 0);
}

#[tokio::test]
async fn test_recheck_errors() {
    let client = MockStatusClient::new();
    client.respond("msg-1", Err("gateway timeout".to_string()));
    let f = fixture(vec![record("msg-1")], client, unpaced()).await;

    assert!(matches!(
        f.monitor.recheck("missing").await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        f.monitor.recheck("msg-1").await,
        Err(DomainError::ExternalService { .. })
    ));
}

#[tokio::test]
async fn test_blank_identifiers_are_rejected() {
    let f = fixture(vec![record("msg-1")], MockStatusClient::new(), unpaced()).await;

    assert!(matches!(
        f.monitor.add_sms_for_monitoring("  ", "13800138000").await,
        Err(DomainError::Validation { .. })
    ));
    assert!(matches!(
        f.monitor.add_sms_for_monitoring("msg-2", "").await,
        Err(DomainError::Validation { .. })
    ));
    assert!(matches!(
        f.monitor.recheck("").await,
        Err(DomainError::Validation { .. })
    ));
    assert!(!f.monitor.is_running());
    assert_eq!(f.monitor.status().await.queue_length, 0);
    assert_eq!(f.client.call_count(), 0);
}
