//! # Infrastructure Layer
//!
//! Concrete implementations of the stores and channels the DuskSpendr
//! authentication core depends on.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Database**: MySQL OTP and user repositories using SQLx
//! - **Cache**: Redis client, the shared TTL store (token blacklist) and the
//!   shared token-bucket limiter
//! - **SMS**: log-only and Twilio senders
//! - **Telemetry**: tracing subscriber setup
//! - **Bootstrap**: validated configuration to a wired-up gateway
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-cache`: Enable Redis support (default)

use ds_core::errors::DomainError;

// Re-export core types for convenience
pub use ds_core::errors::{DomainResult, ErrorKind};

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Cache module - Redis client, TTL store and limiter
#[cfg(feature = "redis-cache")]
pub mod cache;

/// SMS senders
pub mod sms;

/// Tracing subscriber initialisation
pub mod telemetry;

/// Service wiring
#[cfg(all(feature = "mysql", feature = "redis-cache"))]
pub mod bootstrap;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SMS provider rejected the request
    #[error("SMS service error: {0}")]
    Sms(String),
}

impl InfrastructureError {
    /// Collaborator name used in dependency errors
    pub fn service(&self) -> &'static str {
        match self {
            InfrastructureError::Database(_) | InfrastructureError::Migration(_) => "database",
            InfrastructureError::Cache(_) => "redis",
            InfrastructureError::Http(_) | InfrastructureError::Sms(_) => "sms",
            InfrastructureError::Config(_) => "configuration",
        }
    }
}

impl From<InfrastructureError> for DomainError {
    fn from(error: InfrastructureError) -> Self {
        match error {
            InfrastructureError::Config(message) => DomainError::Unconfigured { message },
            other => DomainError::dependency(other.service(), &other),
        }
    }
}

impl From<ds_shared::config::ConfigError> for InfrastructureError {
    fn from(error: ds_shared::config::ConfigError) -> Self {
        InfrastructureError::Config(error.to_string())
    }
}
