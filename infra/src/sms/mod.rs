//! SMS senders
//!
//! - `LogSmsSender` writes a masked line to the log, for local development
//! - `TwilioSmsSender` posts to the Twilio Messages API

mod log_sender;
mod twilio;

#[cfg(test)]
mod tests;

pub use log_sender::LogSmsSender;
pub use twilio::TwilioSmsSender;

use std::sync::Arc;

use ds_core::services::SmsSender;
use ds_shared::config::{SmsConfig, SmsProvider};

use crate::InfrastructureError;

/// Build the sender selected by `config.provider`
pub fn create_sms_sender(config: &SmsConfig) -> Result<Arc<dyn SmsSender>, InfrastructureError> {
    config.validate()?;

    match config.provider {
        SmsProvider::Log => {
            tracing::warn!("SMS provider is 'log'; codes will not be delivered");
            Ok(Arc::new(LogSmsSender::new()))
        }
        SmsProvider::Twilio => Ok(Arc::new(TwilioSmsSender::new(config)?)),
    }
}
