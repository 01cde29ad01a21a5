//! In-process token-bucket limiter

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::{Mutex, MutexGuard};

use ds_shared::config::BucketConfig;

use super::bucket::TokenBucket;

/// Per-key token buckets held in a sharded map.
///
/// `allow` takes a shard read lock plus the one bucket's mutex, so unrelated
/// keys never wait on each other and the cost is independent of the number
/// of live keys. Idle buckets are only removed by [`cleanup`](Self::cleanup),
/// which is driven by a timer rather than the request path.
#[derive(Debug)]
pub struct TokenBucketLimiter {
    config: BucketConfig,
    buckets: DashMap<String, Mutex<TokenBucket>>,
}

impl TokenBucketLimiter {
    pub fn new(config: BucketConfig) -> Self {
        Self {
            config,
            buckets: DashMap::new(),
        }
    }

    /// Build a limiter from raw parameters
    pub fn configure(rate_per_minute: f64, burst: f64, idle_ttl: std::time::Duration) -> Self {
        Self::new(
            BucketConfig::new(rate_per_minute, burst).with_idle_ttl_seconds(idle_ttl.as_secs()),
        )
    }

    pub fn config(&self) -> &BucketConfig {
        &self.config
    }

    /// Limiting is off when rate or burst is not positive
    pub fn is_disabled(&self) -> bool {
        self.config.is_disabled()
    }

    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Utc::now())
    }

    /// Admit or reject one action for `key` at `now`
    pub fn allow_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        if self.is_disabled() {
            return true;
        }

        let rate_per_second = self.config.rate_per_minute / 60.0;
        let burst = self.config.burst;

        if let Some(bucket) = self.buckets.get(key) {
            return lock(&bucket).try_acquire(now, rate_per_second, burst);
        }

        let bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Mutex::new(TokenBucket::full(burst, now)));
        let admitted = lock(bucket.value()).try_acquire(now, rate_per_second, burst);
        admitted
    }

    pub fn cleanup(&self) -> usize {
        self.cleanup_at(Utc::now())
    }

    /// Drop buckets idle for longer than the configured TTL, returning how many went
    pub fn cleanup_at(&self, now: DateTime<Utc>) -> usize {
        let idle_ttl = Duration::seconds(self.config.idle_ttl_seconds as i64);
        let mut removed = 0;
        self.buckets.retain(|_, bucket| {
            let keep = !lock(bucket).is_idle(now, idle_ttl);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Number of live buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.buckets.contains_key(key)
    }

    /// Snapshot of one bucket, mostly for diagnostics
    pub fn bucket(&self, key: &str) -> Option<TokenBucket> {
        self.buckets.get(key).map(|bucket| *lock(&bucket))
    }
}

// A panic while holding a bucket leaves plain numeric state behind, still usable
fn lock(bucket: &Mutex<TokenBucket>) -> MutexGuard<'_, TokenBucket> {
    bucket.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
