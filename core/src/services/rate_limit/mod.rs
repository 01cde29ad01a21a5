//! Token-bucket admission control
//!
//! This module provides:
//! - `TokenBucket`, the refill-then-deduct state for one key
//! - `TokenBucketLimiter`, an in-process table of buckets sharded by key
//! - `RateLimiterTrait`, the seam for shared (multi-instance) limiter stores
//! - `DualKeyGate`, an identity limiter and an address limiter checked together

mod bucket;
mod gate;
mod limiter;
mod traits;

#[cfg(test)]
mod tests;

pub use bucket::TokenBucket;
pub use gate::{DualKeyGate, OTP_SEND_SCOPE, SYNC_INGEST_SCOPE};
pub use limiter::TokenBucketLimiter;
pub use traits::RateLimiterTrait;
