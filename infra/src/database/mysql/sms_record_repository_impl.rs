//! MySQL implementation of the SmsRecordRepository trait.
//!
//! Reads and updates the delivery-status columns of `sms_records`. The
//! `status` column holds the Chinese labels of [`SmsStatus`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::debug;

use sd_core::domain::entities::{SmsRecord, SmsStatus, StatusUpdate};
use sd_core::errors::DomainError;
use sd_core::repositories::SmsRecordRepository;

const SELECT_COLUMNS: &str = r#"
    SELECT out_id, phone_number, status, retry_count, last_retry_at,
           error_code, receive_date, created_at, updated_at
    FROM sms_records
"#;

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::Internal {
        message: format!("{}: {}", context, e),
    }
}

/// MySQL implementation of SmsRecordRepository
pub struct MySqlSmsRecordRepository {
    pool: MySqlPool,
}

impl MySqlSmsRecordRepository {
    /// Create a new repository on an existing pool
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert a database row to an SmsRecord entity
    fn row_to_record(row: &MySqlRow) -> Result<SmsRecord, DomainError> {
        let status: String = row
            .try_get("status")
            .map_err(|e| db_error("Failed to get status", e))?;
        let retry_count: i32 = row
            .try_get("retry_count")
            .map_err(|e| db_error("Failed to get retry_count", e))?;

        Ok(SmsRecord {
            out_id: row
                .try_get("out_id")
                .map_err(|e| db_error("Failed to get out_id", e))?,
            phone_number: row
                .try_get("phone_number")
                .map_err(|e| db_error("Failed to get phone_number", e))?,
            status: status
                .parse::<SmsStatus>()
                .map_err(|message| DomainError::Internal { message })?,
            retry_count: u32::try_from(retry_count).unwrap_or(0),
            last_retry_at: row
                .try_get::<Option<DateTime<Utc>>, _>("last_retry_at")
                .map_err(|e| db_error("Failed to get last_retry_at", e))?,
            error_code: row
                .try_get("error_code")
                .map_err(|e| db_error("Failed to get error_code", e))?,
            receive_date: row
                .try_get("receive_date")
                .map_err(|e| db_error("Failed to get receive_date", e))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| db_error("Failed to get created_at", e))?,
            updated_at: row
                .try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(|e| db_error("Failed to get updated_at", e))?,
        })
    }
}

#[async_trait]
impl SmsRecordRepository for MySqlSmsRecordRepository {
    async fn find_pending(&self, max_retry: u32) -> Result<Vec<SmsRecord>, DomainError> {
        let query = format!(
            "{} WHERE status = ? AND retry_count < ? ORDER BY created_at ASC",
            SELECT_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(SmsStatus::Sending.as_str())
            .bind(max_retry)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load pending SMS records", e))?;

        debug!(count = rows.len(), "Loaded pending SMS records");
        rows.iter().map(Self::row_to_record).collect()
    }

    async fn find_by_out_id(&self, out_id: &str) -> Result<Option<SmsRecord>, DomainError> {
        let query = format!("{} WHERE out_id = ? LIMIT 1", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(out_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find SMS record", e))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn record_retry(
        &self,
        out_id: &str,
        retry_count: u32,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let query = r#"
            UPDATE sms_records
            SET retry_count = ?, last_retry_at = ?, updated_at = ?
            WHERE out_id = ?
        "#;

        let result = sqlx::query(query)
            .bind(retry_count)
            .bind(at)
            .bind(Utc::now())
            .bind(out_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to record SMS retry", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound {
                resource: format!("SMS record {}", out_id),
            });
        }
        Ok(())
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<bool, DomainError> {
        let query = r#"
            UPDATE sms_records
            SET status = ?,
                error_code = COALESCE(?, error_code),
                receive_date = COALESCE(?, receive_date),
                updated_at = ?
            WHERE out_id = ?
        "#;

        let result = sqlx::query(query)
            .bind(update.status.as_str())
            .bind(update.error_code.as_deref())
            .bind(update.receive_date.as_deref())
            .bind(Utc::now())
            .bind(&update.out_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update SMS status", e))?;

        Ok(result.rows_affected() > 0)
    }
}
