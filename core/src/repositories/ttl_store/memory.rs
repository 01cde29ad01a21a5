//! Process-local TTL store

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::errors::DomainError;

use super::r#trait::TtlStore;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// In-memory TTL store for single-instance deployments and tests
///
/// Reads ignore expired entries; they are only reclaimed by
/// [`purge_expired_at`](Self::purge_expired_at).
#[derive(Default, Clone)]
pub struct MemoryTtlStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    should_fail: Arc<AtomicBool>,
}

impl MemoryTtlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a dependency error
    pub fn set_failing(&self, failing: bool) {
        self.should_fail.store(failing, Ordering::SeqCst);
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Remove entries expired at `now`, returning how many were dropped
    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live_at(now));
        before - entries.len()
    }

    async fn live_entry(&self, key: &str) -> Result<Option<Entry>, DomainError> {
        self.check_available()?;
        let now = Utc::now();
        let entries = self.entries.read().await;
        Ok(entries.get(key).filter(|e| e.is_live_at(now)).cloned())
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DomainError::dependency("ttl store", "simulated store failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl TtlStore for MemoryTtlStore {
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), DomainError> {
        self.check_available()?;
        let entry = Entry {
            value: value.to_string(),
            expires_at: Utc::now() + Duration::seconds(ttl_seconds as i64),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.live_entry(key).await?.map(|e| e.value))
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.live_entry(key).await?.is_some())
    }

    async fn ttl(&self, key: &str) -> Result<Option<i64>, DomainError> {
        let now = Utc::now();
        Ok(self
            .live_entry(key)
            .await?
            .map(|e| (e.expires_at - now).num_seconds().max(0)))
    }
}
