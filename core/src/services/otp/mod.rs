//! One-time passcode issuance and verification
//!
//! This module provides:
//! - Persisted-history send limits (per phone, per IP, resend interval)
//! - Hashed, record-bound code storage with a single active code per phone
//! - Attempt-limited, exactly-once verification

mod send_guard;
mod service;
mod types;


pub use service::OtpService;
pub use types::{OtpIssued, OtpVerified};
