use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddTaskRequest {
    #[validate(length(min = 1, max = 64))]
    pub out_id: String,

    #[validate(length(min = 1, max = 32))]
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTaskResponse {
    /// False when the message was already monitored
    pub added: bool,
    pub running: bool,
}

/// Answer of the start and stop endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStateResponse {
    pub running: bool,
    pub message: String,
}
