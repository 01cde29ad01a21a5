//! Rate limiter store abstraction

use async_trait::async_trait;

use crate::errors::DomainResult;

use super::limiter::TokenBucketLimiter;

/// Admission check backed by either process memory or a shared store.
///
/// Implementations must make the refill-then-deduct sequence for one key
/// atomic, without serializing unrelated keys.
#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Admit (`true`) or reject (`false`) one action for `key`
    async fn allow(&self, key: &str) -> DomainResult<bool>;
}

#[async_trait]
impl RateLimiterTrait for TokenBucketLimiter {
    async fn allow(&self, key: &str) -> DomainResult<bool> {
        Ok(TokenBucketLimiter::allow(self, key))
    }
}
