//! Configuration for the authentication service

use ds_shared::config::{AppConfig, Environment};

use crate::domain::entities::otp::DEFAULT_EXPIRATION_MINUTES;

/// Configuration for the authentication service
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    /// Deployment environment; production never echoes codes
    pub environment: Environment,
    /// Return the raw code in send responses (development aid)
    pub echo_code_in_response: bool,
    /// Code lifetime shown in the SMS body, in minutes
    pub code_ttl_minutes: i64,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            echo_code_in_response: false,
            code_ttl_minutes: DEFAULT_EXPIRATION_MINUTES,
        }
    }
}

impl AuthServiceConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            environment: config.environment,
            echo_code_in_response: config.auth.otp.echo_code_in_response,
            code_ttl_minutes: (config.auth.otp.code_ttl_seconds / 60).max(1),
        }
    }

    /// Whether a send response may carry the raw code
    pub fn echo_codes(&self) -> bool {
        self.echo_code_in_response && !self.environment.is_production()
    }
}
