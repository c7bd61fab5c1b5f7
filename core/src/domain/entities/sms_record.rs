//! SMS delivery record entity, mirrored from the `sms_records` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delivery status of an SMS record as stored in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SmsStatus {
    /// Waiting for a delivery receipt
    #[serde(rename = "发送中")]
    Sending,
    /// Receipt confirmed delivery
    #[serde(rename = "已送达")]
    Delivered,
    /// Receipt reported a failure
    #[serde(rename = "发送失败")]
    Failed,
    /// Still sending but the monitor gave up polling
    #[serde(rename = "发送中(已停止查询)")]
    Stopped,
}

impl SmsStatus {
    /// Label stored in the `status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            SmsStatus::Sending => "发送中",
            SmsStatus::Delivered => "已送达",
            SmsStatus::Failed => "发送失败",
            SmsStatus::Stopped => "发送中(已停止查询)",
        }
    }

    /// Delivered or failed; no further polling can change it
    pub fn is_final(&self) -> bool {
        matches!(self, SmsStatus::Delivered | SmsStatus::Failed)
    }
}

impl fmt::Display for SmsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmsStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "发送中" => Ok(SmsStatus::Sending),
            "已送达" => Ok(SmsStatus::Delivered),
            "发送失败" => Ok(SmsStatus::Failed),
            "发送中(已停止查询)" => Ok(SmsStatus::Stopped),
            other => Err(format!("Unknown SMS status: {}", other)),
        }
    }
}

/// A row of `sms_records`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsRecord {
    /// Provider-side message identifier
    pub out_id: String,
    pub phone_number: String,
    pub status: SmsStatus,
    /// Number of status polls that came back without a final answer
    pub retry_count: u32,
    pub last_retry_at: Option<DateTime<Utc>>,
    pub error_code: Option<String>,
    pub receive_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SmsRecord {
    /// New record in the sending state
    pub fn sending(out_id: impl Into<String>, phone_number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            out_id: out_id.into(),
            phone_number: phone_number.into(),
            status: SmsStatus::Sending,
            retry_count: 0,
            last_retry_at: None,
            error_code: None,
            receive_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Result of one delivery-status query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DeliveryReport {
    Delivered { receive_date: Option<String> },
    Failed { error_code: Option<String> },
    Pending,
}

impl DeliveryReport {
    /// Status to persist, if the report is final
    pub fn final_status(&self) -> Option<SmsStatus> {
        match self {
            DeliveryReport::Delivered { .. } => Some(SmsStatus::Delivered),
            DeliveryReport::Failed { .. } => Some(SmsStatus::Failed),
            DeliveryReport::Pending => None,
        }
    }
}

/// A status change to persist for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub out_id: String,
    pub status: SmsStatus,
    pub error_code: Option<String>,
    pub receive_date: Option<String>,
}

impl StatusUpdate {
    /// Update for a final report; `None` for a pending one
    pub fn from_report(out_id: &str, report: &DeliveryReport) -> Option<Self> {
        let status = report.final_status()?;
        let (error_code, receive_date) = match report {
            DeliveryReport::Delivered { receive_date } => (None, receive_date.clone()),
            DeliveryReport::Failed { error_code } => (error_code.clone(), None),
            DeliveryReport::Pending => (None, None),
        };

        Some(Self {
            out_id: out_id.to_string(),
            status,
            error_code,
            receive_date,
        })
    }

    /// Polling gave up after the retry ceiling
    pub fn stopped(out_id: &str) -> Self {
        Self {
            out_id: out_id.to_string(),
            status: SmsStatus::Stopped,
            error_code: None,
            receive_date: None,
        }
    }
}
