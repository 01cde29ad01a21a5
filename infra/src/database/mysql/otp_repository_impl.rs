//! MySQL implementation of OtpRepository
//!
//! The single-use and single-active guarantees are enforced in SQL:
//! `replace_active` runs inside a transaction holding the owning user's row
//! lock, and `mark_consumed` is a conditional update whose affected-row count
//! decides the winner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{mysql::MySqlRow, MySqlPool, Row};
use uuid::Uuid;

use ds_core::domain::entities::otp::OtpRecord;
use ds_core::errors::DomainError;
use ds_core::repositories::OtpRepository;
use ds_shared::utils::phone::mask_phone_number;

use super::{parse_uuid, store_error};

const SELECT_COLUMNS: &str = "id, user_id, phone, code_hash, expires_at, attempts_remaining, \
     created_at, consumed_at, send_ip, verify_ip";

/// MySQL-backed OTP record repository
#[derive(Clone)]
pub struct MySqlOtpRepository {
    pool: MySqlPool,
}

impl MySqlOtpRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &MySqlRow) -> Result<OtpRecord, DomainError> {
        let decode = |e: sqlx::Error| DomainError::Internal {
            message: format!("Failed to decode otp row: {}", e),
        };

        let id: String = row.try_get("id").map_err(decode)?;
        let user_id: String = row.try_get("user_id").map_err(decode)?;

        Ok(OtpRecord {
            id: parse_uuid("id", &id)?,
            user_id: parse_uuid("user_id", &user_id)?,
            phone: row.try_get("phone").map_err(decode)?,
            code_hash: row.try_get("code_hash").map_err(decode)?,
            expires_at: row.try_get("expires_at").map_err(decode)?,
            attempts_remaining: row.try_get("attempts_remaining").map_err(decode)?,
            created_at: row.try_get("created_at").map_err(decode)?,
            consumed_at: row.try_get("consumed_at").map_err(decode)?,
            send_ip: row.try_get("send_ip").map_err(decode)?,
            verify_ip: row.try_get("verify_ip").map_err(decode)?,
        })
    }
}

#[async_trait]
impl OtpRepository for MySqlOtpRepository {
    async fn count_sent_to_phone_since(
        &self,
        phone: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM otp_records WHERE phone = ? AND created_at > ?")
            .bind(phone)
            .bind(since)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error("count_sent_to_phone", e))
    }

    async fn count_sent_from_ip_since(
        &self,
        send_ip: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM otp_records WHERE send_ip = ? AND created_at > ?")
            .bind(send_ip)
            .bind(since)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error("count_sent_from_ip", e))
    }

    async fn latest_created_at(&self, phone: &str) -> Result<Option<DateTime<Utc>>, DomainError> {
        sqlx::query_scalar("SELECT MAX(created_at) FROM otp_records WHERE phone = ?")
            .bind(phone)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error("latest_created_at", e))
    }

    async fn replace_active(&self, record: &OtpRecord) -> Result<u64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("begin_replace_active", e))?;

        // Serialises concurrent sends for the same user
        sqlx::query("SELECT id FROM users WHERE id = ? FOR UPDATE")
            .bind(record.user_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| store_error("lock_user", e))?;

        let invalidated = sqlx::query(
            r#"
            UPDATE otp_records
            SET consumed_at = ?
            WHERE phone = ? AND consumed_at IS NULL
            "#,
        )
        .bind(record.created_at)
        .bind(&record.phone)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("invalidate_active_otps", e))?
        .rows_affected();

        sqlx::query(
            r#"
            INSERT INTO otp_records (
                id, user_id, phone, code_hash, expires_at, attempts_remaining,
                created_at, consumed_at, send_ip, verify_ip
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(&record.phone)
        .bind(&record.code_hash)
        .bind(record.expires_at)
        .bind(record.attempts_remaining)
        .bind(record.created_at)
        .bind(record.consumed_at)
        .bind(&record.send_ip)
        .bind(&record.verify_ip)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("insert_otp", e))?;

        tx.commit()
            .await
            .map_err(|e| store_error("commit_replace_active", e))?;

        tracing::debug!(
            otp_id = %record.id,
            phone = %mask_phone_number(&record.phone),
            invalidated,
            "Stored otp record"
        );

        Ok(invalidated)
    }

    async fn find_active_by_phone(&self, phone: &str) -> Result<Option<OtpRecord>, DomainError> {
        let query = format!(
            "SELECT {} FROM otp_records \
             WHERE phone = ? AND consumed_at IS NULL \
             ORDER BY created_at DESC LIMIT 1",
            SELECT_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("find_active_otp", e))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OtpRecord>, DomainError> {
        let query = format!("SELECT {} FROM otp_records WHERE id = ?", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("find_otp_by_id", e))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn try_consume_attempt(&self, id: Uuid) -> Result<Option<i32>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("begin_consume_attempt", e))?;

        let result = sqlx::query(
            r#"
            UPDATE otp_records
            SET attempts_remaining = attempts_remaining - 1
            WHERE id = ? AND consumed_at IS NULL AND attempts_remaining > 0
            "#,
        )
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("consume_attempt", e))?;

        if result.rows_affected() != 1 {
            tx.rollback()
                .await
                .map_err(|e| store_error("rollback_consume_attempt", e))?;
            return Ok(None);
        }

        let remaining: i32 =
            sqlx::query_scalar("SELECT attempts_remaining FROM otp_records WHERE id = ?")
                .bind(id.to_string())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| store_error("read_attempts", e))?;

        tx.commit()
            .await
            .map_err(|e| store_error("commit_consume_attempt", e))?;

        Ok(Some(remaining))
    }

    async fn mark_consumed(
        &self,
        id: Uuid,
        consumed_at: DateTime<Utc>,
        verify_ip: Option<&str>,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE otp_records
            SET consumed_at = ?, verify_ip = ?
            WHERE id = ? AND consumed_at IS NULL
            "#,
        )
        .bind(consumed_at)
        .bind(verify_ip)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("mark_otp_consumed", e))?;

        Ok(result.rows_affected() == 1)
    }
}
