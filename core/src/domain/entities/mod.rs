//! Domain entities representing core authentication objects.

pub mod otp;
pub mod token;
pub mod user;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use otp::{OtpRecord, OtpStatus, DEFAULT_EXPIRATION_MINUTES, MAX_ATTEMPTS};
pub use token::{Claims, TokenPair, TokenType, JWT_ISSUER};
pub use user::User;
