use async_trait::async_trait;

use ds_core::errors::DomainResult;
use ds_core::services::SmsSender;
use ds_shared::utils::phone::mask_phone_number;

/// Sender that only logs; the message body never reaches the log
#[derive(Debug, Clone, Default)]
pub struct LogSmsSender;

impl LogSmsSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, destination: &str, message: &str) -> DomainResult<()> {
        tracing::info!(
            to = %mask_phone_number(destination),
            length = message.chars().count(),
            "SMS suppressed by log sender"
        );
        Ok(())
    }
}
