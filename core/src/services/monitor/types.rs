//! Types reported by the background SMS monitor

use serde::{Deserialize, Serialize};

use crate::domain::entities::BackgroundSmsTask;

/// Snapshot of the monitor state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    pub running: bool,
    pub processing: bool,
    pub queue_length: usize,
    pub tasks: Vec<BackgroundSmsTask>,
}

/// What happened to one task during a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum TaskOutcome {
    /// Final delivered status persisted
    Delivered,
    /// Final failed status persisted
    Failed,
    /// No final answer yet; will be polled again after backoff
    Retrying { retry_count: u32 },
    /// Retry ceiling reached; polling stopped
    Stopped,
    /// Outcome could not be persisted; task left untouched
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReport {
    pub out_id: String,
    #[serde(flatten)]
    pub outcome: TaskOutcome,
}

/// Summary of one poll tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// The tick overlapped a running one and did nothing
    pub skipped: bool,
    /// Tasks left in the queue after the tick
    pub queue_length: usize,
    pub processed: Vec<TaskReport>,
}

impl TickReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}
