//! Redis-backed TTL store shared by every gateway instance

use async_trait::async_trait;

use ds_core::errors::DomainError;
use ds_core::repositories::TtlStore;

use super::redis_client::RedisClient;

/// [`TtlStore`] over Redis `SET EX` / `TTL`
///
/// Expiry is enforced by Redis itself, so nothing needs sweeping.
#[derive(Clone)]
pub struct RedisTtlStore {
    client: RedisClient,
}

impl RedisTtlStore {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RedisClient {
        &self.client
    }
}

#[async_trait]
impl TtlStore for RedisTtlStore {
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), DomainError> {
        if ttl_seconds == 0 {
            return Err(DomainError::Validation {
                message: "TTL must be positive".to_string(),
            });
        }
        Ok(self
            .client
            .set_with_expiry(&self.client.key(key), value, ttl_seconds)
            .await?)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.client.get(&self.client.key(key)).await?)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.client.exists(&self.client.key(key)).await?)
    }

    async fn ttl(&self, key: &str) -> Result<Option<i64>, DomainError> {
        let ttl = self.client.ttl(&self.client.key(key)).await?;
        // Every key written through this store carries an expiry
        Ok((ttl >= 0).then_some(ttl))
    }
}
