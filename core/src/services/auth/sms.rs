//! Outbound SMS capability

use async_trait::async_trait;

use crate::errors::DomainResult;

/// Trait for SMS delivery
///
/// Implementations report provider or network failures as
/// `DomainError::Dependency`.
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Deliver `message` to `destination` (E.164)
    async fn send(&self, destination: &str, message: &str) -> DomainResult<()>;
}

/// Body of the verification SMS
pub fn verification_message(code: &str, ttl_minutes: i64) -> String {
    format!(
        "Your DuskSpendr verification code is {}. It expires in {} minutes.",
        code, ttl_minutes
    )
}
