//! In-memory implementation of OtpRepository for single-instance use and tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::otp::OtpRecord;
use crate::errors::DomainError;

use super::r#trait::OtpRepository;

/// In-memory OTP repository
///
/// All mutations take the same write lock, which gives `replace_active`,
/// `try_consume_attempt` and `mark_consumed` their atomicity.
#[derive(Default, Clone)]
pub struct InMemoryOtpRepository {
    records: Arc<RwLock<Vec<OtpRecord>>>,
    should_fail: Arc<AtomicBool>,
}

impl InMemoryOtpRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a dependency error
    pub fn set_failing(&self, failing: bool) {
        self.should_fail.store(failing, Ordering::SeqCst);
    }

    /// All records for a phone, oldest first
    pub async fn records_for(&self, phone: &str) -> Vec<OtpRecord> {
        let records = self.records.read().await;
        records.iter().filter(|r| r.phone == phone).cloned().collect()
    }

    /// Apply `f` to a stored record, returning false if it does not exist
    pub async fn modify<F>(&self, id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut OtpRecord),
    {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DomainError::dependency("otp store", "simulated store failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl OtpRepository for InMemoryOtpRepository {
    async fn count_sent_to_phone_since(
        &self,
        phone: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, DomainError> {
        self.check_available()?;
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.phone == phone && r.created_at > since)
            .count() as i64)
    }

    async fn count_sent_from_ip_since(
        &self,
        send_ip: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, DomainError> {
        self.check_available()?;
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.send_ip.as_deref() == Some(send_ip) && r.created_at > since)
            .count() as i64)
    }

    async fn latest_created_at(&self, phone: &str) -> Result<Option<DateTime<Utc>>, DomainError> {
        self.check_available()?;
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.phone == phone)
            .map(|r| r.created_at)
            .max())
    }

    async fn replace_active(&self, record: &OtpRecord) -> Result<u64, DomainError> {
        self.check_available()?;
        let mut records = self.records.write().await;
        let mut invalidated = 0;
        for existing in records
            .iter_mut()
            .filter(|r| r.phone == record.phone && r.consumed_at.is_none())
        {
            existing.consumed_at = Some(record.created_at);
            invalidated += 1;
        }
        records.push(record.clone());
        Ok(invalidated)
    }

    async fn find_active_by_phone(&self, phone: &str) -> Result<Option<OtpRecord>, DomainError> {
        self.check_available()?;
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.phone == phone && r.consumed_at.is_none())
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OtpRecord>, DomainError> {
        self.check_available()?;
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn try_consume_attempt(&self, id: Uuid) -> Result<Option<i32>, DomainError> {
        self.check_available()?;
        let mut records = self.records.write().await;
        match records
            .iter_mut()
            .find(|r| r.id == id && r.consumed_at.is_none() && r.attempts_remaining > 0)
        {
            Some(record) => {
                record.attempts_remaining -= 1;
                Ok(Some(record.attempts_remaining))
            }
            None => Ok(None),
        }
    }

    async fn mark_consumed(
        &self,
        id: Uuid,
        consumed_at: DateTime<Utc>,
        verify_ip: Option<&str>,
    ) -> Result<bool, DomainError> {
        self.check_available()?;
        let mut records = self.records.write().await;
        match records
            .iter_mut()
            .find(|r| r.id == id && r.consumed_at.is_none())
        {
            Some(record) => {
                record.consumed_at = Some(consumed_at);
                record.verify_ip = verify_ip.map(str::to_string);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
