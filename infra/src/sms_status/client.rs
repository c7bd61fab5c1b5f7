//! HTTP implementation of the monitor's status client

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use sd_core::domain::entities::DeliveryReport;
use sd_core::errors::DomainError;
use sd_core::services::monitor::SmsStatusClient;

use crate::lookup::{HttpRequest, HttpTransport};

const SERVICE_NAME: &str = "sms-status";

/// `sendStatus` values of the status API
const SEND_STATUS_WAITING: i64 = 1;
const SEND_STATUS_FAILED: i64 = 2;
const SEND_STATUS_DELIVERED: i64 = 3;

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<StatusData>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusData {
    send_status: i64,
    #[serde(default)]
    err_code: Option<serde_json::Value>,
    #[serde(default)]
    receive_date: Option<String>,
}

fn external(message: impl Into<String>) -> DomainError {
    DomainError::ExternalService {
        service: SERVICE_NAME.to_string(),
        message: message.into(),
    }
}

fn code_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Queries `GET {base}/api/sms-status?outId=&phoneNumber=`
pub struct HttpSmsStatusClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    timeout: Duration,
}

impl HttpSmsStatusClient {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: &str, timeout: Duration) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn status_url(&self, out_id: &str, phone_number: &str) -> Result<String, DomainError> {
        let endpoint = format!("{}/api/sms-status", self.base_url);
        reqwest::Url::parse_with_params(&endpoint, &[("outId", out_id), ("phoneNumber", phone_number)])
            .map(String::from)
            .map_err(|e| DomainError::Internal {
                message: format!("Invalid SMS status API URL {}: {}", endpoint, e),
            })
    }

    fn to_report(out_id: &str, data: StatusData) -> DeliveryReport {
        match data.send_status {
            SEND_STATUS_DELIVERED => DeliveryReport::Delivered {
                receive_date: data.receive_date.filter(|d| !d.trim().is_empty()),
            },
            SEND_STATUS_FAILED => DeliveryReport::Failed {
                error_code: data.err_code.and_then(code_to_string),
            },
            SEND_STATUS_WAITING => DeliveryReport::Pending,
            other => {
                warn!(out_id, send_status = other, "Unknown sendStatus, treating as pending");
                DeliveryReport::Pending
            }
        }
    }
}

#[async_trait]
impl SmsStatusClient for HttpSmsStatusClient {
    async fn query_status(&self, out_id: &str, phone_number: &str) -> Result<DeliveryReport, DomainError> {
        let request = HttpRequest::get(self.status_url(out_id, phone_number)?).timeout(self.timeout);
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| external(e.to_string()))?;

        if !response.is_success() {
            return Err(external(format!("HTTP {}", response.status)));
        }

        let envelope: StatusEnvelope = response
            .json()
            .map_err(|e| external(format!("malformed response: {}", e)))?;

        if !envelope.success {
            return Err(external(
                envelope
                    .message
                    .unwrap_or_else(|| "status query unsuccessful".to_string()),
            ));
        }

        let data = envelope
            .data
            .ok_or_else(|| external("malformed response: missing data"))?;
        let report = Self::to_report(out_id, data);
        debug!(out_id, ?report, "SMS status queried");
        Ok(report)
    }
}
