//! Domain-specific error types and error handling.

mod types;


pub use types::{AuthError, TokenError, ValidationError};

use ds_shared::config::ConfigError;
use ds_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};
use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A required secret is absent or unusable
    #[error("Service not configured: {message}")]
    Unconfigured { message: String },

    /// A store or network collaborator failed
    #[error("{service} unavailable: {message}")]
    Dependency { service: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    ValidationErr(#[from] ValidationError),
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Caller-facing classification of every failure in this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    RateLimited,
    InvalidCredential,
    Expired,
    AttemptsExhausted,
    Revoked,
    Unconfigured,
    Dependency,
    Internal,
}

impl ErrorKind {
    /// HTTP status class for the presentation layer
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::InvalidInput => 400,
            ErrorKind::InvalidCredential
            | ErrorKind::Expired
            | ErrorKind::AttemptsExhausted
            | ErrorKind::Revoked => 401,
            ErrorKind::RateLimited => 429,
            ErrorKind::Unconfigured | ErrorKind::Dependency => 503,
            ErrorKind::Internal => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => error_codes::INVALID_INPUT,
            ErrorKind::RateLimited => error_codes::RATE_LIMITED,
            ErrorKind::InvalidCredential => error_codes::INVALID_CREDENTIAL,
            ErrorKind::Expired => error_codes::EXPIRED,
            ErrorKind::AttemptsExhausted => error_codes::ATTEMPTS_EXHAUSTED,
            ErrorKind::Revoked => error_codes::REVOKED,
            ErrorKind::Unconfigured => error_codes::UNCONFIGURED,
            ErrorKind::Dependency => error_codes::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => error_codes::INTERNAL_ERROR,
        }
    }
}

impl DomainError {
    /// Build a dependency failure for a named collaborator
    pub fn dependency(service: impl Into<String>, error: impl std::fmt::Display) -> Self {
        DomainError::Dependency {
            service: service.into(),
            message: error.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation { .. } | DomainError::ValidationErr(_) => ErrorKind::InvalidInput,
            DomainError::Unconfigured { .. } => ErrorKind::Unconfigured,
            DomainError::Dependency { .. } => ErrorKind::Dependency,
            DomainError::Internal { .. } => ErrorKind::Internal,
            DomainError::Auth(e) => match e {
                AuthError::InvalidPhoneFormat => ErrorKind::InvalidInput,
                AuthError::InvalidVerificationCode | AuthError::MissingBearerToken => {
                    ErrorKind::InvalidCredential
                }
                AuthError::VerificationCodeExpired => ErrorKind::Expired,
                AuthError::MaxAttemptsExceeded => ErrorKind::AttemptsExhausted,
                AuthError::RateLimitExceeded { .. } => ErrorKind::RateLimited,
            },
            DomainError::Token(e) => match e {
                TokenError::TokenExpired => ErrorKind::Expired,
                TokenError::TokenRevoked => ErrorKind::Revoked,
                TokenError::TokenGenerationFailed => ErrorKind::Internal,
                TokenError::InvalidTokenFormat
                | TokenError::InvalidSignature
                | TokenError::WrongTokenType { .. }
                | TokenError::MissingClaim { .. } => ErrorKind::InvalidCredential,
            },
        }
    }

    pub fn is_dependency(&self) -> bool {
        self.kind() == ErrorKind::Dependency
    }
}

impl From<ConfigError> for DomainError {
    fn from(error: ConfigError) -> Self {
        DomainError::Unconfigured {
            message: error.to_string(),
        }
    }
}

impl IntoErrorResponse for DomainError {
    fn to_error_response(&self) -> ErrorResponse {
        let kind = self.kind();
        match self {
            // Never leak collaborator or internal details to callers
            DomainError::Dependency { .. } => {
                ErrorResponse::new(kind.code(), "Service temporarily unavailable")
            }
            DomainError::Unconfigured { .. } | DomainError::Internal { .. } => {
                ErrorResponse::new(kind.code(), "Internal server error")
            }
            DomainError::Token(TokenError::TokenGenerationFailed) => {
                ErrorResponse::new(kind.code(), "Internal server error")
            }
            DomainError::Auth(AuthError::RateLimitExceeded {
                scope,
                retry_after_seconds,
            }) => {
                let response = ErrorResponse::new(kind.code(), self.to_string())
                    .add_detail("scope", scope);
                match retry_after_seconds {
                    Some(seconds) => response.add_detail("retry_after_seconds", seconds),
                    None => response,
                }
            }
            _ => ErrorResponse::new(kind.code(), self.to_string()),
        }
    }
}
