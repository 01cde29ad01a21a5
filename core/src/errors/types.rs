//! Domain-specific error types for authentication and token operations
//!
//! Messages here are user-facing. Anything that could help enumerate
//! accounts (for example "no code was ever sent to this phone") shares the
//! generic variant.

use thiserror::Error;

/// Authentication-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Phone must be in E.164 format")]
    InvalidPhoneFormat,

    /// Wrong code, no outstanding code, or a code consumed by a concurrent request
    #[error("Invalid verification code")]
    InvalidVerificationCode,

    #[error("Verification code expired")]
    VerificationCodeExpired,

    #[error("Too many attempts. Please request a new code")]
    MaxAttemptsExceeded,

    #[error("Too many requests. Please try again later")]
    RateLimitExceeded {
        scope: String,
        retry_after_seconds: Option<i64>,
    },

    #[error("Missing or malformed bearer token")]
    MissingBearerToken,
}

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token format")]
    InvalidTokenFormat,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Unexpected token type: expected {expected}")]
    WrongTokenType { expected: String },

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Missing claim: {claim}")]
    MissingClaim { claim: String },

    #[error("Token generation failed")]
    TokenGenerationFailed,
}

/// Validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field: {field}")]
    RequiredField { field: String },

    #[error("Invalid format: {field}")]
    InvalidFormat { field: String },

    #[error("Invalid length: {field} (expected: {expected}, actual: {actual})")]
    InvalidLength {
        field: String,
        expected: usize,
        actual: usize,
    },
}
