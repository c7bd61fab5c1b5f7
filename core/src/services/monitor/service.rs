//! Background SMS monitor service

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use sd_shared::phone::mask_phone_number;

use crate::domain::entities::{BackgroundSmsTask, SmsRecord, SmsStatus, StatusUpdate};
use crate::errors::DomainError;
use crate::repositories::SmsRecordRepository;

use super::config::MonitorConfig;
use super::traits::SmsStatusClient;
use super::types::{MonitorStatus, TaskOutcome, TaskReport, TickReport};

struct Worker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Clears the processing flag when a tick ends, even by panic
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Polls the SMS status API for messages still awaiting a receipt
///
/// The monitor runs as a single background task started with
/// [`BackgroundSmsMonitor::start`]. Every tick re-reads the pending records
/// from the repository, picks up to `batch_size` tasks whose backoff window
/// has elapsed and queries them one after another. The loop exits on its own
/// once nothing is left to poll; [`BackgroundSmsMonitor::add_sms_for_monitoring`]
/// restarts it.
pub struct BackgroundSmsMonitor<R, C>
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    repository: Arc<R>,
    client: Arc<C>,
    config: MonitorConfig,
    queue: Mutex<Vec<BackgroundSmsTask>>,
    running: AtomicBool,
    processing: AtomicBool,
    worker: Mutex<Option<Worker>>,
}

impl<R, C> BackgroundSmsMonitor<R, C>
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    /// Create a stopped monitor
    pub fn new(repository: Arc<R>, client: Arc<C>, config: MonitorConfig) -> Self {
        Self {
            repository,
            client,
            config,
            queue: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            processing: AtomicBool::new(false),
            worker: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Load pending records and spawn the poll loop
    ///
    /// # Returns
    /// * `Ok(true)` - The loop is running (started now or already running)
    /// * `Ok(false)` - No pending record is past its backoff window; the
    ///   monitor stays stopped
    /// * `Err(DomainError)` - Pending records could not be loaded
    pub async fn start(self: &Arc<Self>) -> Result<bool, DomainError> {
        let mut worker = self.worker.lock().await;
        if self.is_running() {
            debug!("SMS monitor already running");
            return Ok(true);
        }

        let queue_length = self.refresh_queue().await?;
        let due = self.eligible_count().await;
        if due == 0 {
            info!(queue_length, "No SMS due for a status poll, monitor stays idle");
            return Ok(false);
        }

        let (shutdown, receiver) = watch::channel(false);
        self.running.store(true, Ordering::SeqCst);
        let monitor = Arc::clone(self);
        let handle = tokio::spawn(async move { monitor.run(receiver).await });

        // a previous loop that drained its queue has already exited
        *worker = Some(Worker { shutdown, handle });

        info!(
            queue_length,
            due,
            interval_secs = self.config.poll_interval.as_secs(),
            batch_size = self.config.batch_size,
            "SMS monitor started"
        );
        Ok(true)
    }

    /// Signal the poll loop to exit and wait for it
    ///
    /// Returns false when no loop was running. An in-flight tick is allowed
    /// to finish first.
    pub async fn stop(&self) -> bool {
        let Some(worker) = self.worker.lock().await.take() else {
            return false;
        };

        let was_running = self.running.swap(false, Ordering::SeqCst);
        let _ = worker.shutdown.send(true);
        if let Err(e) = worker.handle.await {
            error!(error = %e, "SMS monitor loop terminated abnormally");
        }

        if was_running {
            info!("SMS monitor stopped");
        }
        was_running
    }

    async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.poll_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    self.poll_once().await;

                    let queue = self.queue.lock().await;
                    if queue.is_empty() {
                        self.running.store(false, Ordering::SeqCst);
                        info!("SMS monitor queue drained, stopping");
                        break;
                    }
                }
            }
        }
        debug!("SMS monitor loop exited");
    }

    /// Run one poll tick
    ///
    /// A tick overlapping one still in progress is skipped.
    pub async fn poll_once(&self) -> TickReport {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Previous tick still processing, skipping");
            return TickReport::skipped();
        }
        let _guard = ProcessingGuard(&self.processing);

        if let Err(e) = self.refresh_queue().await {
            warn!(error = %e, "Failed to refresh SMS queue, using current queue");
        }

        let now = Utc::now();
        let batch: Vec<BackgroundSmsTask> = {
            let queue = self.queue.lock().await;
            queue
                .iter()
                .filter(|t| t.retry_count < self.config.max_retry_count)
                .filter(|t| t.is_eligible(now, &self.config.backoff))
                .take(self.config.batch_size)
                .cloned()
                .collect()
        };

        if batch.is_empty() {
            let queue_length = self.queue.lock().await.len();
            debug!(queue_length, "No SMS eligible for a status poll");
            return TickReport {
                skipped: false,
                queue_length,
                processed: Vec::new(),
            };
        }

        info!(selected = batch.len(), "Polling SMS delivery status");

        let mut processed = Vec::with_capacity(batch.len());
        for (index, task) in batch.iter().enumerate() {
            if index > 0 && !self.config.pacing_delay.is_zero() {
                tokio::time::sleep(self.config.pacing_delay).await;
            }
            let outcome = self.process_task(task).await;
            processed.push(TaskReport {
                out_id: task.out_id.clone(),
                outcome,
            });
        }

        let queue_length = self.queue.lock().await.len();
        TickReport {
            skipped: false,
            queue_length,
            processed,
        }
    }

    /// Add a message to the queue, starting the monitor if it is stopped
    ///
    /// Returns whether the message was newly queued; re-adding a monitored
    /// `out_id` is a no-op. Blank identifiers are a validation error.
    pub async fn add_sms_for_monitoring(
        self: &Arc<Self>,
        out_id: &str,
        phone_number: &str,
    ) -> Result<bool, DomainError> {
        let out_id = require_non_blank("outId", out_id)?;
        let phone_number = require_non_blank("phoneNumber", phone_number)?;

        let added = {
            let mut queue = self.queue.lock().await;
            let added = if queue.iter().any(|t| t.out_id == out_id) {
                debug!(out_id, "SMS already monitored");
                false
            } else {
                queue.push(BackgroundSmsTask::new(out_id, phone_number));
                info!(
                    out_id,
                    phone = %mask_phone_number(phone_number),
                    "SMS added to delivery monitoring"
                );
                true
            };

            if self.is_running() {
                return Ok(added);
            }
            added
        };

        self.start().await?;
        Ok(added)
    }

    /// Query one record right away, ignoring backoff and the retry ceiling
    ///
    /// Final records are returned unchanged without a query. A final answer
    /// is persisted; a pending answer leaves the record as it was.
    pub async fn recheck(&self, out_id: &str) -> Result<SmsRecord, DomainError> {
        let out_id = require_non_blank("outId", out_id)?;
        let record = self.find_record(out_id).await?;
        if record.status.is_final() {
            debug!(out_id, status = %record.status, "Record already final, skipping recheck");
            return Ok(record);
        }

        let report = self
            .client
            .query_status(&record.out_id, &record.phone_number)
            .await?;

        match StatusUpdate::from_report(out_id, &report) {
            Some(update) => {
                self.repository.update_status(&update).await?;
                self.remove_task(out_id).await;
                info!(out_id, status = %update.status, "Manual recheck resolved SMS status");
                self.find_record(out_id).await
            }
            None => {
                info!(out_id, "Manual recheck: still waiting for receipt");
                Ok(record)
            }
        }
    }

    /// Snapshot of the monitor state
    pub async fn status(&self) -> MonitorStatus {
        let tasks = self.queue.lock().await.clone();
        MonitorStatus {
            running: self.is_running(),
            processing: self.processing.load(Ordering::SeqCst),
            queue_length: tasks.len(),
            tasks,
        }
    }

    /// Replace the queue with the pending records of the repository
    async fn refresh_queue(&self) -> Result<usize, DomainError> {
        let records = self
            .repository
            .find_pending(self.config.max_retry_count)
            .await?;

        let mut queue = self.queue.lock().await;
        *queue = records.iter().map(BackgroundSmsTask::from).collect();
        debug!(queue_length = queue.len(), "SMS queue refreshed");
        Ok(queue.len())
    }

    /// Queued tasks under the retry ceiling whose backoff window has elapsed
    async fn eligible_count(&self) -> usize {
        let now = Utc::now();
        self.queue
            .lock()
            .await
            .iter()
            .filter(|t| t.retry_count < self.config.max_retry_count)
            .filter(|t| t.is_eligible(now, &self.config.backoff))
            .count()
    }

    async fn process_task(&self, task: &BackgroundSmsTask) -> TaskOutcome {
        let report = match self
            .client
            .query_status(&task.out_id, &task.phone_number)
            .await
        {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(out_id = %task.out_id, error = %e, "SMS status query failed");
                None
            }
        };

        if let Some(update) = report
            .as_ref()
            .and_then(|r| StatusUpdate::from_report(&task.out_id, r))
        {
            if let Err(e) = self.repository.update_status(&update).await {
                error!(out_id = %task.out_id, error = %e, "Failed to persist SMS status");
                return TaskOutcome::Error {
                    message: e.to_string(),
                };
            }

            self.remove_task(&task.out_id).await;
            info!(
                out_id = %task.out_id,
                phone = %mask_phone_number(&task.phone_number),
                status = %update.status,
                "SMS delivery status resolved"
            );
            return match update.status {
                SmsStatus::Delivered => TaskOutcome::Delivered,
                _ => TaskOutcome::Failed,
            };
        }

        let retry_count = task.retry_count + 1;
        let now = Utc::now();
        if let Err(e) = self
            .repository
            .record_retry(&task.out_id, retry_count, now)
            .await
        {
            error!(out_id = %task.out_id, error = %e, "Failed to persist SMS retry");
            return TaskOutcome::Error {
                message: e.to_string(),
            };
        }

        if retry_count >= self.config.max_retry_count {
            if let Err(e) = self
                .repository
                .update_status(&StatusUpdate::stopped(&task.out_id))
                .await
            {
                error!(out_id = %task.out_id, error = %e, "Failed to mark SMS as stopped");
                return TaskOutcome::Error {
                    message: e.to_string(),
                };
            }

            self.remove_task(&task.out_id).await;
            warn!(
                out_id = %task.out_id,
                retry_count,
                "Retry ceiling reached, SMS status polling stopped"
            );
            return TaskOutcome::Stopped;
        }

        let mut queue = self.queue.lock().await;
        if let Some(queued) = queue.iter_mut().find(|t| t.out_id == task.out_id) {
            queued.retry_count = retry_count;
            queued.last_retry_at = Some(now);
        }
        debug!(
            out_id = %task.out_id,
            retry_count,
            next_poll_at = ?queue
                .iter()
                .find(|t| t.out_id == task.out_id)
                .and_then(|t| t.next_eligible_at(&self.config.backoff)),
            "SMS still pending"
        );
        TaskOutcome::Retrying { retry_count }
    }

    async fn remove_task(&self, out_id: &str) {
        self.queue.lock().await.retain(|t| t.out_id != out_id);
    }

    async fn find_record(&self, out_id: &str) -> Result<SmsRecord, DomainError> {
        self.repository
            .find_by_out_id(out_id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                resource: format!("SMS record {}", out_id),
            })
    }
}

fn require_non_blank<'a>(field: &str, value: &'a str) -> Result<&'a str, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed)
}
