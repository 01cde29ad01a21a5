//! Redis client with retrying connection setup
//!
//! Wraps a single multiplexed connection; clones share it. Commands run
//! exactly once and surface failures to the caller.

use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use ds_shared::config::CacheConfig;

use crate::InfrastructureError;

/// Upper bound for the exponential backoff between connection attempts
const MAX_RETRY_DELAY_MS: u64 = 5000;

/// Redis client
#[derive(Clone)]
pub struct RedisClient {
    /// Redis multiplexed connection for async operations
    connection: MultiplexedConnection,
    /// Configuration used to create this client
    config: CacheConfig,
}

impl RedisClient {
    /// Connect using the retry settings carried by `config`
    ///
    /// # Returns
    /// * `Result<Self, InfrastructureError>` - Redis client or error
    pub async fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        info!(url = %mask_url(&config.url), "Creating Redis client");

        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!(error = %e, "Failed to parse Redis URL");
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let connection =
            Self::create_connection_with_retry(client, config.max_retries, config.retry_delay_ms)
                .await?;

        info!("Redis client created successfully");

        Ok(Self { connection, config })
    }

    async fn create_connection_with_retry(
        client: Client,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> Result<MultiplexedConnection, InfrastructureError> {
        let mut attempts = 0;
        let mut delay = retry_delay_ms;

        loop {
            attempts += 1;
            debug!(attempt = attempts, "Attempting to connect to Redis");

            match client.get_multiplexed_async_connection().await {
                Ok(connection) => {
                    info!("Successfully connected to Redis");
                    return Ok(connection);
                }
                Err(e) if attempts < max_retries => {
                    warn!(
                        "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY_MS);
                }
                Err(e) => {
                    error!(attempts, error = %e, "Failed to connect to Redis");
                    return Err(InfrastructureError::Cache(e));
                }
            }
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Fresh handle onto the shared multiplexed connection
    pub fn get_connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// Key with the configured prefix applied
    pub fn key(&self, key: &str) -> String {
        self.config.prefixed(key)
    }

    /// Set a value with expiration time
    ///
    /// # Arguments
    /// * `key` - Cache key (already prefixed)
    /// * `value` - Value to cache
    /// * `expiry_seconds` - Time to live in seconds
    pub async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), InfrastructureError> {
        debug!(key, expiry_seconds, "Setting key");

        self.get_connection()
            .set_ex::<_, _, ()>(key, value, expiry_seconds)
            .await
            .map_err(|e| {
                error!(key, error = %e, "Failed to set key");
                InfrastructureError::Cache(e)
            })
    }

    /// Get a value, `None` when missing or expired
    pub async fn get(&self, key: &str) -> Result<Option<String>, InfrastructureError> {
        self.get_connection()
            .get::<_, Option<String>>(key)
            .await
            .map_err(|e| {
                error!(key, error = %e, "Failed to get key");
                InfrastructureError::Cache(e)
            })
    }

    pub async fn exists(&self, key: &str) -> Result<bool, InfrastructureError> {
        self.get_connection()
            .exists::<_, bool>(key)
            .await
            .map_err(|e| {
                error!(key, error = %e, "Failed to check key");
                InfrastructureError::Cache(e)
            })
    }

    /// Raw `TTL` reply: -2 when the key is missing, -1 when it never expires
    pub async fn ttl(&self, key: &str) -> Result<i64, InfrastructureError> {
        self.get_connection()
            .ttl::<_, i64>(key)
            .await
            .map_err(|e| {
                error!(key, error = %e, "Failed to read key ttl");
                InfrastructureError::Cache(e)
            })
    }

    /// Delete a key, returning whether it existed
    pub async fn delete(&self, key: &str) -> Result<bool, InfrastructureError> {
        self.get_connection()
            .del::<_, u32>(key)
            .await
            .map(|deleted| deleted > 0)
            .map_err(|e| {
                error!(key, error = %e, "Failed to delete key");
                InfrastructureError::Cache(e)
            })
    }

    /// PING the server
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let mut conn = self.get_connection();
        let response = redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| {
                error!(error = %e, "Redis health check failed");
                InfrastructureError::Cache(e)
            })?;

        if response != "PONG" {
            warn!(response = %response, "Redis health check returned unexpected response");
            return Ok(false);
        }
        Ok(true)
    }
}

/// Hide the password component of a Redis URL for logging
pub fn mask_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let rest = &url[scheme_end + 3..];
    let Some(at) = rest.rfind('@') else {
        return url.to_string();
    };

    let credentials = &rest[..at];
    let masked = match credentials.find(':') {
        Some(colon) => format!("{}:****", &credentials[..colon]),
        None => "****".to_string(),
    };

    format!("{}://{}@{}", &url[..scheme_end], masked, &rest[at + 1..])
}
