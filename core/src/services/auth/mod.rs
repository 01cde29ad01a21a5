//! Authentication service module
//!
//! This module ties the OTP state machine, the send gate and the token
//! service into the flows the gateway exposes:
//! - Phone verification via SMS
//! - Token issuance, refresh and strict rotation
//! - Logout and bearer-token authentication

mod config;
mod service;
mod sms;


pub use config::AuthServiceConfig;
pub use service::{parse_bearer_token, AuthService};
pub use sms::{verification_message, SmsSender};
