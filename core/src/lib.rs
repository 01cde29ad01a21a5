//! # DuskSpendr Core
//!
//! Authentication and abuse-control domain layer for the DuskSpendr gateway.
//! This crate contains the domain entities, the OTP and token services, the
//! token-bucket rate limiter, repository/store interfaces with in-memory
//! implementations, and the error taxonomy shared by every layer above it.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
