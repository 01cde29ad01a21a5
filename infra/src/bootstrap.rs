//! Wiring from a validated `AppConfig` to ready-to-use services
//!
//! OTP-send buckets live in Redis so every instance spends from the same
//! allowance. Sync-ingest buckets stay in process memory and are swept by the
//! cleanup task; per-instance ingest limits are acceptable there.

use std::sync::Arc;
use tokio::task::JoinHandle;

use ds_core::services::auth::{AuthService, AuthServiceConfig};
use ds_core::services::cleanup::{CleanupConfig, CleanupService};
use ds_core::services::otp::OtpService;
use ds_core::services::rate_limit::{DualKeyGate, OTP_SEND_SCOPE, SYNC_INGEST_SCOPE};
use ds_core::services::token::TokenService;
use ds_shared::config::AppConfig;

use crate::cache::{RedisClient, RedisTokenBucketLimiter, RedisTtlStore};
use crate::database::{DatabasePool, MySqlOtpRepository, MySqlUserRepository};
use crate::sms::create_sms_sender;
use crate::InfrastructureError;

fn unconfigured(error: ds_core::errors::DomainError) -> InfrastructureError {
    InfrastructureError::Config(error.to_string())
}

pub type GatewayAuthService = AuthService<MySqlOtpRepository, MySqlUserRepository, RedisTtlStore>;
pub type GatewayTokenService = TokenService<RedisTtlStore>;

/// Every long-lived component of the auth gateway
pub struct Gateway {
    config: AppConfig,
    database: DatabasePool,
    redis: RedisClient,
    auth: Arc<GatewayAuthService>,
    otp_send_gate: Arc<DualKeyGate>,
    sync_ingest_gate: Arc<DualKeyGate>,
    cleanup: Arc<CleanupService>,
}

impl Gateway {
    /// Validate `config`, connect to MySQL and Redis, and wire the services
    ///
    /// Missing or placeholder secrets are rejected before any connection
    /// is attempted.
    pub async fn build(config: AppConfig) -> Result<Self, InfrastructureError> {
        config.validate()?;
        let sms_sender = create_sms_sender(&config.sms)?;

        tracing::info!(environment = %config.environment, "Building auth gateway");

        let database = DatabasePool::new(config.database.clone()).await?;
        database.run_migrations().await?;
        let redis = RedisClient::new(config.cache.clone()).await?;

        let users = Arc::new(MySqlUserRepository::new(database.get_pool().clone()));
        let otps = Arc::new(MySqlOtpRepository::new(database.get_pool().clone()));

        let otp_service = Arc::new(
            OtpService::new(otps, users.clone(), config.auth.otp.clone()).map_err(unconfigured)?,
        );
        let token_service = Arc::new(
            TokenService::new(RedisTtlStore::new(redis.clone()), config.auth.jwt.clone())
                .map_err(unconfigured)?,
        );

        let otp_send_gate = Arc::new(DualKeyGate::new(
            OTP_SEND_SCOPE,
            Arc::new(RedisTokenBucketLimiter::new(
                redis.clone(),
                config.rate_limit.otp_send.identity,
            )),
            Arc::new(RedisTokenBucketLimiter::new(
                redis.clone(),
                config.rate_limit.otp_send.address,
            )),
        ));
        let sync_ingest_gate = Arc::new(DualKeyGate::in_memory(
            SYNC_INGEST_SCOPE,
            &config.rate_limit.sync_ingest,
        ));

        let auth = Arc::new(AuthService::new(
            users,
            otp_service,
            token_service,
            otp_send_gate.clone(),
            sms_sender,
            AuthServiceConfig::from_app_config(&config),
        ));

        let cleanup = Arc::new(
            CleanupService::new(CleanupConfig {
                interval_seconds: config.rate_limit.sweep_interval_seconds,
                enabled: true,
            })
            .with_target(sync_ingest_gate.clone()),
        );

        tracing::info!("Auth gateway ready");

        Ok(Self {
            config,
            database,
            redis,
            auth,
            otp_send_gate,
            sync_ingest_gate,
            cleanup,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn auth(&self) -> &Arc<GatewayAuthService> {
        &self.auth
    }

    pub fn tokens(&self) -> &Arc<GatewayTokenService> {
        self.auth.token_service()
    }

    pub fn otp_send_gate(&self) -> &Arc<DualKeyGate> {
        &self.otp_send_gate
    }

    /// Per-user / per-IP buckets for the sync ingestion endpoints
    pub fn sync_ingest_gate(&self) -> &Arc<DualKeyGate> {
        &self.sync_ingest_gate
    }

    /// Spawn the periodic sweep of in-process limiter state
    pub fn start_cleanup(&self) -> Option<JoinHandle<()>> {
        self.cleanup.clone().start_background_task()
    }

    /// Both backing stores answer
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let database = self.database.health_check().await?;
        let redis = self.redis.health_check().await?;
        Ok(database && redis)
    }

    pub async fn shutdown(&self) {
        tracing::info!("Shutting down auth gateway");
        self.database.close().await;
    }
}
