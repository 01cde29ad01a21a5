//! Single token bucket

use chrono::{DateTime, Utc};

/// Fractional allowance for one key.
///
/// `tokens` stays within `[0, burst]` after every operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenBucket {
    tokens: f64,
    last_refill: DateTime<Utc>,
}

impl TokenBucket {
    /// New buckets start full
    pub fn full(burst: f64, now: DateTime<Utc>) -> Self {
        Self {
            tokens: burst,
            last_refill: now,
        }
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn last_refill(&self) -> DateTime<Utc> {
        self.last_refill
    }

    /// Refill for the time elapsed since the last update, then try to take one token.
    ///
    /// The refill is applied even when the call is rejected. A clock that moves
    /// backwards adds nothing and does not rewind `last_refill`.
    pub fn try_acquire(&mut self, now: DateTime<Utc>, rate_per_second: f64, burst: f64) -> bool {
        if now > self.last_refill {
            let elapsed = (now - self.last_refill).num_microseconds().unwrap_or(i64::MAX) as f64
                / 1_000_000.0;
            self.tokens = (self.tokens + elapsed * rate_per_second).min(burst);
            self.last_refill = now;
        }

        if self.tokens < 1.0 {
            return false;
        }

        self.tokens -= 1.0;
        true
    }

    /// Whether the bucket has gone untouched for longer than `idle_ttl`
    pub fn is_idle(&self, now: DateTime<Utc>, idle_ttl: chrono::Duration) -> bool {
        now - self.last_refill > idle_ttl
    }
}
