//! Cache module - Redis-backed shared state
//!
//! Everything that must be agreed on by every gateway instance lives here:
//! the token blacklist and the token buckets in front of rate-limited routes.

pub mod rate_limiter;
pub mod redis_client;
pub mod ttl_store;


pub use rate_limiter::RedisTokenBucketLimiter;
pub use redis_client::{mask_url, RedisClient};
pub use ttl_store::RedisTtlStore;
