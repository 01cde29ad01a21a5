//! Identity + source address admission

use std::sync::Arc;

use ds_shared::config::DualKeyLimitConfig;
use ds_shared::utils::phone::mask_phone_number;

use crate::errors::{AuthError, DomainError, DomainResult};

use super::limiter::TokenBucketLimiter;
use super::traits::RateLimiterTrait;

/// Scope name for OTP sends (per phone, per IP)
pub const OTP_SEND_SCOPE: &str = "otp-send";

/// Scope name for sync ingestion (per user, per IP)
pub const SYNC_INGEST_SCOPE: &str = "sync-ingest";

/// Two independently configured limiters checked together.
///
/// The identity limiter runs first; an identity rejection does not spend
/// an address token. Empty keys skip their limiter.
pub struct DualKeyGate {
    scope: &'static str,
    identity: Arc<dyn RateLimiterTrait>,
    address: Arc<dyn RateLimiterTrait>,
    local: Vec<Arc<TokenBucketLimiter>>,
}

impl DualKeyGate {
    pub fn new(
        scope: &'static str,
        identity: Arc<dyn RateLimiterTrait>,
        address: Arc<dyn RateLimiterTrait>,
    ) -> Self {
        Self {
            scope,
            identity,
            address,
            local: Vec::new(),
        }
    }

    /// Gate backed by process memory, suitable for a single instance
    pub fn in_memory(scope: &'static str, config: &DualKeyLimitConfig) -> Self {
        let identity = Arc::new(TokenBucketLimiter::new(config.identity));
        let address = Arc::new(TokenBucketLimiter::new(config.address));
        Self {
            scope,
            identity: identity.clone(),
            address: address.clone(),
            local: vec![identity, address],
        }
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }

    /// In-process limiters owned by this gate (empty for shared stores)
    pub fn local_limiters(&self) -> &[Arc<TokenBucketLimiter>] {
        &self.local
    }

    /// Admit one action or fail with `RateLimited`
    pub async fn check(&self, identity: &str, address: Option<&str>) -> DomainResult<()> {
        let identity = identity.trim();
        if !identity.is_empty() {
            let key = format!("{}:id:{}", self.scope, identity);
            if !self.identity.allow(&key).await? {
                tracing::warn!(
                    scope = self.scope,
                    identity = %mask_phone_number(identity),
                    event = "rate_limit_exceeded",
                    "Identity rate limit exceeded"
                );
                return Err(self.rejected("identity"));
            }
        }

        if let Some(address) = address.map(str::trim).filter(|a| !a.is_empty()) {
            let key = format!("{}:ip:{}", self.scope, address);
            if !self.address.allow(&key).await? {
                tracing::warn!(
                    scope = self.scope,
                    ip = address,
                    event = "rate_limit_exceeded",
                    "Address rate limit exceeded"
                );
                return Err(self.rejected("address"));
            }
        }

        Ok(())
    }

    fn rejected(&self, granularity: &str) -> DomainError {
        DomainError::Auth(AuthError::RateLimitExceeded {
            scope: format!("{}:{}", self.scope, granularity),
            retry_after_seconds: None,
        })
    }
}
