//! OTP record repository module.

mod r#trait;
pub use r#trait::OtpRepository;

mod memory;
pub use memory::InMemoryOtpRepository;

#[cfg(test)]
mod tests;
