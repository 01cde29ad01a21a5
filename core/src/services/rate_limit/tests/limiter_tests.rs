//! Unit tests for the in-process token-bucket limiter

use chrono::{Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ds_shared::config::BucketConfig;

use crate::services::rate_limit::TokenBucketLimiter;

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
}

fn limiter(rate_per_minute: f64, burst: f64) -> TokenBucketLimiter {
    TokenBucketLimiter::new(BucketConfig::new(rate_per_minute, burst).with_idle_ttl_seconds(600))
}

#[test]
fn test_burst_then_refill_one_per_second() {
    let limiter = limiter(60.0, 10.0);
    let now = t0();

    for i in 0..10 {
        assert!(limiter.allow_at("user-1", now), "call {} should pass", i + 1);
    }
    assert!(!limiter.allow_at("user-1", now));

    let later = now + Duration::seconds(1);
    assert!(limiter.allow_at("user-1", later));
    assert!(!limiter.allow_at("user-1", later));
}

#[test]
fn test_rejection_still_updates_state() {
    let limiter = limiter(60.0, 1.0);
    let now = t0();

    assert!(limiter.allow_at("k", now));
    assert!(!limiter.allow_at("k", now + Duration::milliseconds(500)));

    let bucket = limiter.bucket("k").unwrap();
    assert_eq!(bucket.last_refill(), now + Duration::milliseconds(500));
    assert!((bucket.tokens() - 0.5).abs() < 1e-9);
    assert!(limiter.allow_at("k", now + Duration::seconds(1)));
}

#[test]
fn test_tokens_capped_at_burst() {
    let limiter = limiter(60.0, 5.0);
    let now = t0();

    assert!(limiter.allow_at("k", now));
    let much_later = now + Duration::hours(2);
    for _ in 0..5 {
        assert!(limiter.allow_at("k", much_later));
    }
    assert!(!limiter.allow_at("k", much_later));

    let bucket = limiter.bucket("k").unwrap();
    assert!(bucket.tokens() >= 0.0 && bucket.tokens() <= 5.0);
}

#[test]
fn test_keys_are_independent() {
    let limiter = limiter(60.0, 2.0);
    let now = t0();

    assert!(limiter.allow_at("a", now));
    assert!(limiter.allow_at("a", now));
    assert!(!limiter.allow_at("a", now));
    assert!(limiter.allow_at("b", now));
}

#[test]
fn test_non_positive_limits_disable_limiting() {
    for (rate, burst) in [(0.0, 10.0), (60.0, 0.0), (-1.0, 10.0), (60.0, -5.0)] {
        let limiter = limiter(rate, burst);
        assert!(limiter.is_disabled());
        for _ in 0..100 {
            assert!(limiter.allow_at("k", t0()));
        }
        assert!(limiter.is_empty());
    }
}

#[test]
fn test_clock_going_backwards_adds_nothing() {
    let limiter = limiter(60.0, 1.0);
    let now = t0();

    assert!(limiter.allow_at("k", now));
    assert!(!limiter.allow_at("k", now - Duration::seconds(30)));
    assert_eq!(limiter.bucket("k").unwrap().last_refill(), now);
}

#[test]
fn test_cleanup_removes_only_idle_buckets() {
    let limiter = limiter(60.0, 10.0);
    let now = t0();

    assert!(limiter.allow_at("stale", now));

    // Traffic on other keys never sweeps the stale bucket by itself
    for i in 0..500 {
        limiter.allow_at(&format!("other-{}", i % 3), now + Duration::seconds(i));
    }
    let after_ttl = now + Duration::seconds(601);
    assert!(limiter.allow_at("fresh", after_ttl));
    assert!(limiter.contains_key("stale"));

    let removed = limiter.cleanup_at(after_ttl);
    assert_eq!(removed, 1);
    assert!(!limiter.contains_key("stale"));
    assert!(limiter.contains_key("fresh"));
    assert!(limiter.contains_key("other-0"));
}

#[test]
fn test_bucket_at_exact_ttl_is_kept() {
    let limiter = limiter(60.0, 10.0);
    let now = t0();

    assert!(limiter.allow_at("k", now));
    assert_eq!(limiter.cleanup_at(now + Duration::seconds(600)), 0);
    assert_eq!(limiter.cleanup_at(now + Duration::seconds(601)), 1);
    assert!(limiter.is_empty());
}

#[test]
fn test_concurrent_callers_share_one_bucket() {
    let limiter = Arc::new(limiter(0.0001, 50.0));
    let admitted = Arc::new(AtomicUsize::new(0));
    let now = t0();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let limiter = limiter.clone();
            let admitted = admitted.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    if limiter.allow_at("shared", now) {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(admitted.load(Ordering::SeqCst), 50);
    assert_eq!(limiter.len(), 1);
}

#[test]
fn test_configure_constructor() {
    let limiter = TokenBucketLimiter::configure(120.0, 60.0, std::time::Duration::from_secs(300));
    assert_eq!(limiter.config().rate_per_minute, 120.0);
    assert_eq!(limiter.config().burst, 60.0);
    assert_eq!(limiter.config().idle_ttl_seconds, 300);
}
