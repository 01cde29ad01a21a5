//! Persistence contracts and their in-memory implementations

pub mod otp;
pub mod ttl_store;
pub mod user;

pub use otp::{InMemoryOtpRepository, OtpRepository};
pub use ttl_store::{MemoryTtlStore, TtlStore};
pub use user::{InMemoryUserRepository, UserRepository};
