//! Token service module for JWT management
//!
//! This module handles:
//! - Access / refresh token issuance under two distinct signing secrets
//! - Verified decoding with class and blacklist checks
//! - Revocation by `jti` with a TTL matching the token's remaining lifetime

mod service;


pub use service::{TokenService, UnverifiedClaims, BLACKLIST_KEY_PREFIX};
