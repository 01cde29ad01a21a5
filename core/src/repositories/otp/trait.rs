//! OTP repository trait defining the persistence contract for issued codes.
//!
//! Records are append-only from the caller's point of view: they are
//! consumed, decremented or left to expire, never deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::otp::OtpRecord;
use crate::errors::DomainError;

/// Repository trait for OTP record persistence
///
/// Every store failure must come back as `DomainError::Dependency` so callers
/// can tell an outage from a rejected code.
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Count records issued to `phone` with `created_at > since`
    async fn count_sent_to_phone_since(
        &self,
        phone: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, DomainError>;

    /// Count records issued from `send_ip` with `created_at > since`
    async fn count_sent_from_ip_since(
        &self,
        send_ip: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, DomainError>;

    /// Creation time of the most recent record for `phone`, consumed or not
    async fn latest_created_at(&self, phone: &str) -> Result<Option<DateTime<Utc>>, DomainError>;

    /// Consume every unconsumed record for `record.phone` and insert `record`
    ///
    /// Both steps happen atomically, so at most one unconsumed record exists
    /// per phone. Prior records get `consumed_at = record.created_at`.
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of prior records that were invalidated
    async fn replace_active(&self, record: &OtpRecord) -> Result<u64, DomainError>;

    /// Most recent unconsumed record for `phone`
    async fn find_active_by_phone(&self, phone: &str) -> Result<Option<OtpRecord>, DomainError>;

    /// Find a record by id regardless of state
    async fn find_by_id(&self, id: Uuid) -> Result<Option<OtpRecord>, DomainError>;

    /// Reserve one verification attempt on an unconsumed record
    ///
    /// The check and the decrement are a single atomic step, so concurrent
    /// callers can never spend more attempts than the record holds.
    ///
    /// # Returns
    /// * `Ok(Some(i32))` - Attempt reserved; attempts left afterwards
    /// * `Ok(None)` - No attempts left, or the record is consumed or missing
    async fn try_consume_attempt(&self, id: Uuid) -> Result<Option<i32>, DomainError>;

    /// Set `consumed_at` and `verify_ip` only if the record is still unconsumed
    ///
    /// # Returns
    /// * `Ok(true)` - This call consumed the record
    /// * `Ok(false)` - The record was already consumed (lost a race)
    async fn mark_consumed(
        &self,
        id: Uuid,
        consumed_at: DateTime<Utc>,
        verify_ip: Option<&str>,
    ) -> Result<bool, DomainError>;
}
