//! Types for OTP service results

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Result of issuing a code
///
/// `code` is the only copy of the raw code. It goes to the SMS sender and,
/// in development, back to the client; it is never persisted or logged.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpIssued {
    pub otp_id: Uuid,
    pub user_id: Uuid,
    pub phone: String,
    pub expires_at: DateTime<Utc>,
    pub code: String,
}

impl fmt::Debug for OtpIssued {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpIssued")
            .field("otp_id", &self.otp_id)
            .field("user_id", &self.user_id)
            .field("phone", &self.phone)
            .field("expires_at", &self.expires_at)
            .field("code", &"****")
            .finish()
    }
}

/// Result of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpVerified {
    pub otp_id: Uuid,
    pub user_id: Uuid,
    pub phone: String,
    pub verified_at: DateTime<Utc>,
}
