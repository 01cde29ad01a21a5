//! Cleanup service for periodic sweeps of limiter buckets and TTL entries

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::DomainResult;
use crate::repositories::MemoryTtlStore;
use crate::services::rate_limit::{DualKeyGate, TokenBucketLimiter};

/// Anything holding expirable in-process state
#[async_trait]
pub trait Sweepable: Send + Sync {
    /// Name used in logs and results
    fn name(&self) -> &str;

    /// Drop state that is stale at `now`, returning how many entries went
    async fn sweep(&self, now: DateTime<Utc>) -> DomainResult<usize>;
}

#[async_trait]
impl Sweepable for TokenBucketLimiter {
    fn name(&self) -> &str {
        "rate_limit_buckets"
    }

    async fn sweep(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        Ok(self.cleanup_at(now))
    }
}

#[async_trait]
impl Sweepable for DualKeyGate {
    fn name(&self) -> &str {
        self.scope()
    }

    async fn sweep(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        Ok(self
            .local_limiters()
            .iter()
            .map(|limiter| limiter.cleanup_at(now))
            .sum())
    }
}

#[async_trait]
impl Sweepable for MemoryTtlStore {
    fn name(&self) -> &str {
        "ttl_store"
    }

    async fn sweep(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        Ok(self.purge_expired_at(now).await)
    }
}

/// Configuration for the cleanup service
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_seconds: u64,
    /// Whether to enable automatic cleanup
    pub enabled: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 60,
            enabled: true,
        }
    }
}

/// Service sweeping every registered target on an interval
pub struct CleanupService {
    targets: Vec<Arc<dyn Sweepable>>,
    config: CleanupConfig,
}

impl CleanupService {
    pub fn new(config: CleanupConfig) -> Self {
        Self {
            targets: Vec::new(),
            config,
        }
    }

    /// Register a sweep target
    pub fn with_target(mut self, target: Arc<dyn Sweepable>) -> Self {
        self.targets.push(target);
        self
    }

    pub fn targets(&self) -> usize {
        self.targets.len()
    }

    /// Run a single cleanup cycle
    ///
    /// A failing target is recorded and does not stop the others.
    pub async fn run_cleanup(&self) -> CleanupResult {
        self.run_cleanup_at(Utc::now()).await
    }

    pub async fn run_cleanup_at(&self, now: DateTime<Utc>) -> CleanupResult {
        let mut result = CleanupResult::default();
        if !self.config.enabled {
            return result;
        }

        for target in &self.targets {
            match target.sweep(now).await {
                Ok(count) => result.swept.push((target.name().to_string(), count)),
                Err(e) => {
                    error!(target = target.name(), error = %e, "Sweep failed");
                    result.errors.push(format!("{}: {}", target.name(), e));
                }
            }
        }

        if result.total_cleaned() > 0 || !result.is_success() {
            info!(
                cleaned = result.total_cleaned(),
                errors = result.errors.len(),
                event = "cleanup_cycle",
                "Cleanup cycle completed"
            );
        }
        result
    }

    /// Start the cleanup service as a background task
    ///
    /// Returns `None` when disabled.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Cleanup service is disabled");
            return None;
        }

        let period = std::time::Duration::from_secs(self.config.interval_seconds.max(1));

        Some(tokio::spawn(async move {
            info!(
                interval_seconds = period.as_secs(),
                targets = self.targets.len(),
                "Cleanup service started"
            );

            let mut interval_timer = tokio::time::interval(period);
            // The first tick completes immediately
            interval_timer.tick().await;

            loop {
                interval_timer.tick().await;
                let result = self.run_cleanup().await;
                if !result.is_success() {
                    warn!(errors = ?result.errors, "Cleanup completed with errors");
                }
            }
        }))
    }
}

/// Result of a cleanup operation
#[derive(Debug, Default)]
pub struct CleanupResult {
    /// Entries removed per target name
    pub swept: Vec<(String, usize)>,
    /// Any errors encountered during cleanup
    pub errors: Vec<String>,
}

impl CleanupResult {
    /// Check if the cleanup was successful (no errors)
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get total number of items cleaned up
    pub fn total_cleaned(&self) -> usize {
        self.swept.iter().map(|(_, count)| count).sum()
    }

    pub fn cleaned_for(&self, name: &str) -> Option<usize> {
        self.swept
            .iter()
            .find(|(target, _)| target == name)
            .map(|(_, count)| *count)
    }
}
