//! Redis-backed token-bucket limiter for multi-instance deployments

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use redis::Script;

use ds_core::errors::{DomainError, DomainResult};
use ds_core::services::RateLimiterTrait;
use ds_shared::config::BucketConfig;

use super::redis_client::RedisClient;

/// Refill-then-deduct for one bucket, run atomically by Redis.
///
/// KEYS[1] bucket hash; ARGV: rate (tokens/ms), burst, now (ms), idle ttl (ms).
/// A `now` behind the stored timestamp refills nothing.
static TOKEN_BUCKET_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
local rate = tonumber(ARGV[1])
local burst = tonumber(ARGV[2])
local now = tonumber(ARGV[3])
local idle_ttl = tonumber(ARGV[4])

local state = redis.call('HMGET', KEYS[1], 'tokens', 'ts')
local tokens = tonumber(state[1])
local ts = tonumber(state[2])
if tokens == nil or ts == nil then
    tokens = burst
    ts = now
end

if now > ts then
    tokens = math.min(burst, tokens + (now - ts) * rate)
    ts = now
end

local allowed = 0
if tokens >= 1 then
    tokens = tokens - 1
    allowed = 1
end

redis.call('HSET', KEYS[1], 'tokens', tostring(tokens), 'ts', tostring(ts))
redis.call('PEXPIRE', KEYS[1], idle_ttl)
return allowed
"#,
    )
});

/// Token buckets stored as Redis hashes under `ratelimit:{key}`
///
/// Idle buckets expire through `PEXPIRE`, so unlike the in-process limiter
/// there is nothing to sweep.
#[derive(Clone)]
pub struct RedisTokenBucketLimiter {
    client: RedisClient,
    config: BucketConfig,
}

impl RedisTokenBucketLimiter {
    pub fn new(client: RedisClient, config: BucketConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &BucketConfig {
        &self.config
    }

    fn bucket_key(&self, key: &str) -> String {
        self.client.key(&format!("ratelimit:{}", key))
    }
}

#[async_trait]
impl RateLimiterTrait for RedisTokenBucketLimiter {
    async fn allow(&self, key: &str) -> DomainResult<bool> {
        if self.config.is_disabled() {
            return Ok(true);
        }

        let bucket_key = self.bucket_key(key);
        let rate_per_ms = self.config.rate_per_minute / 60_000.0;
        let burst = self.config.burst;
        let now_ms = Utc::now().timestamp_millis();
        let idle_ttl_ms = self.config.idle_ttl_seconds.max(1).saturating_mul(1000);

        // The script spends a token, so a failed call is never replayed
        let mut conn = self.client.get_connection();
        let allowed: i64 = TOKEN_BUCKET_SCRIPT
            .key(&bucket_key)
            .arg(rate_per_ms)
            .arg(burst)
            .arg(now_ms)
            .arg(idle_ttl_ms)
            .invoke_async::<_, i64>(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!(key = %bucket_key, error = %e, "Rate limit script failed");
                DomainError::dependency("redis", e)
            })?;

        Ok(allowed == 1)
    }
}
