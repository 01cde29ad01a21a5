//! Rate limiting configuration module

use serde::{Deserialize, Serialize};

use super::env_or;

/// Token bucket parameters for a single limiter
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BucketConfig {
    /// Steady refill rate in tokens per minute
    pub rate_per_minute: f64,

    /// Maximum tokens a bucket can hold
    pub burst: f64,

    /// Buckets untouched for longer than this are swept
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_seconds: u64,
}

impl BucketConfig {
    pub fn new(rate_per_minute: f64, burst: f64) -> Self {
        Self {
            rate_per_minute,
            burst,
            idle_ttl_seconds: default_idle_ttl(),
        }
    }

    pub fn with_idle_ttl_seconds(mut self, seconds: u64) -> Self {
        self.idle_ttl_seconds = seconds;
        self
    }

    /// A non-positive rate or burst turns the limiter off
    pub fn is_disabled(&self) -> bool {
        self.rate_per_minute <= 0.0 || self.burst <= 0.0
    }
}

/// Limits applied at two granularities at once: the caller's identity
/// (phone number, user id) and its source address
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct DualKeyLimitConfig {
    pub identity: BucketConfig,
    pub address: BucketConfig,
}

/// Rate limiting configuration
///
/// | Variable                          | Default |
/// |-----------------------------------|---------|
/// | `OTP_SEND_RPM` / `OTP_SEND_BURST` | 1 / 3   |
/// | `OTP_SEND_IP_RPM` / `OTP_SEND_IP_BURST` | 10 / 30 |
/// | `SYNC_INGEST_RPM` / `SYNC_INGEST_BURST` | 120 / 60 |
/// | `SYNC_INGEST_IP_RPM`              | 600 (burst shared with `SYNC_INGEST_BURST`) |
/// | `RATE_LIMIT_IDLE_TTL_SECONDS`     | 600     |
/// | `RATE_LIMIT_SWEEP_INTERVAL_SECONDS` | 60    |
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Token buckets in front of OTP sends (per phone, per IP)
    pub otp_send: DualKeyLimitConfig,

    /// Token buckets in front of sync ingestion (per user, per IP)
    pub sync_ingest: DualKeyLimitConfig,

    /// How often idle buckets are swept, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            otp_send: DualKeyLimitConfig {
                identity: BucketConfig::new(1.0, 3.0),
                address: BucketConfig::new(10.0, 30.0),
            },
            sync_ingest: DualKeyLimitConfig {
                identity: BucketConfig::new(120.0, 60.0),
                address: BucketConfig::new(600.0, 60.0),
            },
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl RateLimitConfig {
    /// Create a relaxed configuration for development
    pub fn development() -> Self {
        let mut config = Self::default();
        config.otp_send.identity = BucketConfig::new(10.0, 10.0);
        config.otp_send.address = BucketConfig::new(100.0, 100.0);
        config
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let idle_ttl = env_or("RATE_LIMIT_IDLE_TTL_SECONDS", default_idle_ttl());
        let ingest_burst = env_or("SYNC_INGEST_BURST", defaults.sync_ingest.identity.burst);

        let bucket = |rate_key: &str, rate: f64, burst_key: Option<&str>, burst: f64| {
            let burst = match burst_key {
                Some(key) => env_or(key, burst),
                None => burst,
            };
            BucketConfig::new(env_or(rate_key, rate), burst).with_idle_ttl_seconds(idle_ttl)
        };

        Self {
            otp_send: DualKeyLimitConfig {
                identity: bucket(
                    "OTP_SEND_RPM",
                    defaults.otp_send.identity.rate_per_minute,
                    Some("OTP_SEND_BURST"),
                    defaults.otp_send.identity.burst,
                ),
                address: bucket(
                    "OTP_SEND_IP_RPM",
                    defaults.otp_send.address.rate_per_minute,
                    Some("OTP_SEND_IP_BURST"),
                    defaults.otp_send.address.burst,
                ),
            },
            sync_ingest: DualKeyLimitConfig {
                identity: bucket(
                    "SYNC_INGEST_RPM",
                    defaults.sync_ingest.identity.rate_per_minute,
                    None,
                    ingest_burst,
                ),
                address: bucket(
                    "SYNC_INGEST_IP_RPM",
                    defaults.sync_ingest.address.rate_per_minute,
                    None,
                    ingest_burst,
                ),
            },
            sweep_interval_seconds: env_or(
                "RATE_LIMIT_SWEEP_INTERVAL_SECONDS",
                defaults.sweep_interval_seconds,
            ),
        }
    }
}

fn default_idle_ttl() -> u64 {
    600 // 10 minutes
}

fn default_sweep_interval() -> u64 {
    60
}
