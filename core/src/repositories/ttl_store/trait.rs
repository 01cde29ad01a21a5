use async_trait::async_trait;

use crate::errors::DomainError;

/// Key/value store whose entries disappear once their TTL elapses
///
/// Backs the token blacklist. Implementations report every store failure as
/// `DomainError::Dependency`; callers decide whether to fail open or closed.
#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Store `value` under `key` for `ttl_seconds` (must be positive)
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), DomainError>;

    /// Value under `key`, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    async fn exists(&self, key: &str) -> Result<bool, DomainError>;

    /// Remaining lifetime in seconds, `None` when absent or expired
    async fn ttl(&self, key: &str) -> Result<Option<i64>, DomainError>;
}
