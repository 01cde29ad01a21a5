//! Periodic maintenance for in-process state
//!
//! Idle rate-limit buckets and expired TTL entries are reclaimed on a timer,
//! never on the request path.

mod service;


pub use service::{CleanupConfig, CleanupResult, CleanupService, Sweepable};
