//! Shared utilities and common types for the DuskSpendr gateway
//!
//! This crate provides common functionality used across the gateway crates:
//! - Configuration types and environment loading
//! - Error response structures and stable error codes
//! - Utility functions (phone validation and masking)

pub mod config;
pub mod errors;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, BucketConfig, CacheConfig, ConfigError, DatabaseConfig,
    DualKeyLimitConfig, Environment, JwtConfig, LogFormat, LoggingConfig, OtpConfig,
    RateLimitConfig, Secret, SmsConfig, SmsProvider,
};
pub use errors::{error_codes, ErrorResponse, IntoErrorResponse};
pub use utils::phone;
