//! Twilio SMS sender
//!
//! Sends through the Messages REST API with a plain `reqwest` client.
//! One request per message; failures are not retried so a slow provider
//! can never deliver the same code twice.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

use ds_core::errors::{DomainError, DomainResult};
use ds_core::services::SmsSender;
use ds_shared::config::SmsConfig;
use ds_shared::utils::phone::mask_phone_number;

use crate::InfrastructureError;

const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Error body returned by Twilio on non-2xx responses
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
}

pub struct TwilioSmsSender {
    http: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioSmsSender {
    pub fn new(config: &SmsConfig) -> Result<Self, InfrastructureError> {
        let account_sid = config.twilio_account_sid.trim();
        let auth_token = config.twilio_auth_token.expose();
        let from_number = config.twilio_from_number.trim();

        if account_sid.is_empty() || auth_token.is_empty() || from_number.is_empty() {
            return Err(InfrastructureError::Config(
                "Twilio credentials missing".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        info!(
            from = %mask_phone_number(from_number),
            "Twilio SMS sender initialized"
        );

        Ok(Self {
            http,
            base_url: TWILIO_API_BASE.to_string(),
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            from_number: from_number.to_string(),
        })
    }

    /// Point the sender at another API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }

    async fn post_message(&self, to: &str, body: &str) -> Result<String, InfrastructureError> {
        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", body)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let message: TwilioMessage = response.json().await?;
            return Ok(message.sid);
        }

        let detail = match response.json::<TwilioErrorBody>().await {
            Ok(TwilioErrorBody {
                message: Some(message),
                code,
            }) => match code {
                Some(code) => format!("twilio error {}: {}", code, message),
                None => format!("twilio error: {}", message),
            },
            _ => format!("twilio error (status {})", status.as_u16()),
        };

        Err(InfrastructureError::Sms(detail))
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send(&self, destination: &str, message: &str) -> DomainResult<()> {
        match self.post_message(destination, message).await {
            Ok(sid) => {
                info!(to = %mask_phone_number(destination), sid = %sid, "SMS sent");
                Ok(())
            }
            Err(e) => {
                error!(to = %mask_phone_number(destination), error = %e, "SMS send failed");
                Err(DomainError::dependency("sms", e))
            }
        }
    }
}
