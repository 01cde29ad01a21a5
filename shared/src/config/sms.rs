//! Outbound SMS configuration

use serde::{Deserialize, Serialize};

use super::{env_or, env_string, ConfigError, Secret};

/// Which sender delivers codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SmsProvider {
    /// Write the message to the log instead of sending it
    #[default]
    Log,
    /// Twilio Messages API
    Twilio,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SmsConfig {
    pub provider: SmsProvider,

    #[serde(default)]
    pub twilio_account_sid: String,

    #[serde(default)]
    pub twilio_auth_token: Secret,

    #[serde(default)]
    pub twilio_from_number: String,

    /// Request timeout for the provider API in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl SmsConfig {
    /// Twilio is selected only when all three credentials are present
    pub fn from_env() -> Self {
        let account_sid = env_string("TWILIO_ACCOUNT_SID").unwrap_or_default();
        let auth_token = env_string("TWILIO_AUTH_TOKEN").unwrap_or_default();
        let from_number = env_string("TWILIO_FROM_NUMBER").unwrap_or_default();

        let provider = if !account_sid.is_empty() && !auth_token.is_empty() && !from_number.is_empty()
        {
            SmsProvider::Twilio
        } else {
            SmsProvider::Log
        };

        Self {
            provider,
            twilio_account_sid: account_sid,
            twilio_auth_token: Secret::new(auth_token),
            twilio_from_number: from_number,
            timeout_seconds: env_or("SMS_TIMEOUT_SECONDS", default_timeout()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider == SmsProvider::Twilio {
            if self.twilio_account_sid.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    name: "TWILIO_ACCOUNT_SID".to_string(),
                    value: String::new(),
                });
            }
            self.twilio_auth_token.require("TWILIO_AUTH_TOKEN")?;
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    10
}
