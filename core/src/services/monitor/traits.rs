//! Trait definitions for monitor dependencies

use async_trait::async_trait;

use crate::domain::entities::DeliveryReport;
use crate::errors::DomainError;

/// Client of the external SMS status API
#[async_trait]
pub trait SmsStatusClient: Send + Sync {
    /// Query the delivery state of one message
    ///
    /// Transport failures and error envelopes are returned as `Err`; the
    /// monitor treats them like a pending answer.
    async fn query_status(&self, out_id: &str, phone_number: &str) -> Result<DeliveryReport, DomainError>;
}
