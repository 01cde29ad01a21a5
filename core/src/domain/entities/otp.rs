//! One-time passcode records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default code lifetime in minutes
pub const DEFAULT_EXPIRATION_MINUTES: i64 = 5;

/// Default verification attempts per code
pub const MAX_ATTEMPTS: i32 = 5;

/// Lifecycle state of a record at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpStatus {
    Active,
    Consumed,
    Expired,
    AttemptsExhausted,
}

/// A single issued code.
///
/// Only the digest of the code is stored. The digest is bound to `id`, so a
/// code issued for one record can never validate against another. Records are
/// never deleted; a record is dead once consumed, expired or out of attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// E.164 destination
    pub phone: String,
    /// Hex SHA-256 of `pepper:id:code`
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub attempts_remaining: i32,
    pub created_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub send_ip: Option<String>,
    pub verify_ip: Option<String>,
}

impl OtpRecord {
    /// Creates a fresh unconsumed record.
    ///
    /// `id` must be the same identifier that was fed into the digest.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        user_id: Uuid,
        phone: impl Into<String>,
        code_hash: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
        max_attempts: i32,
        send_ip: Option<String>,
    ) -> Self {
        Self {
            id,
            user_id,
            phone: phone.into(),
            code_hash: code_hash.into(),
            expires_at: now + ttl,
            attempts_remaining: max_attempts,
            created_at: now,
            consumed_at: None,
            send_ip,
            verify_ip: None,
        }
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Expired strictly after `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn has_attempts_remaining(&self) -> bool {
        self.attempts_remaining > 0
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> OtpStatus {
        if self.is_consumed() {
            OtpStatus::Consumed
        } else if self.is_expired_at(now) {
            OtpStatus::Expired
        } else if !self.has_attempts_remaining() {
            OtpStatus::AttemptsExhausted
        } else {
            OtpStatus::Active
        }
    }
}
