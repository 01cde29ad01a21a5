//! MySQL repository implementations

mod otp_repository_impl;
mod user_repository_impl;

pub use otp_repository_impl::MySqlOtpRepository;
pub use user_repository_impl::MySqlUserRepository;

use ds_core::errors::DomainError;

/// Map a SQLx failure onto the domain's dependency error
pub(crate) fn store_error(operation: &str, error: sqlx::Error) -> DomainError {
    tracing::error!(operation, error = %error, "Database operation failed");
    DomainError::dependency("database", error)
}

/// Rows carry UUIDs as CHAR(36)
pub(crate) fn parse_uuid(column: &str, value: &str) -> Result<uuid::Uuid, DomainError> {
    uuid::Uuid::parse_str(value).map_err(|e| DomainError::Internal {
        message: format!("Invalid UUID in column {}: {}", column, e),
    })
}
