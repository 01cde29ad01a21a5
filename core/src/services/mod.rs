//! Business services containing domain logic and use cases.

pub mod auth;
pub mod cleanup;
pub mod otp;
pub mod rate_limit;
pub mod secret;
pub mod token;

// Re-export commonly used types
pub use auth::{AuthService, AuthServiceConfig, SmsSender};
pub use cleanup::{CleanupConfig, CleanupResult, CleanupService, Sweepable};
pub use otp::{OtpIssued, OtpService, OtpVerified};
pub use rate_limit::{
    DualKeyGate, RateLimiterTrait, TokenBucket, TokenBucketLimiter, OTP_SEND_SCOPE,
    SYNC_INGEST_SCOPE,
};
pub use token::{TokenService, UnverifiedClaims};
