//! Dry-run notifier that writes rendered messages to the log.

use async_trait::async_trait;
use tracing::info;

use vestibulare_entity::subscription::Channel;

use super::template::{TemplateContext, render};
use super::{DeliveryError, Notifier, Recipient};

/// Logs each message instead of delivering it.
#[derive(Debug, Clone, Copy)]
pub struct LogNotifier {
    channel: Channel,
}

impl LogNotifier {
    /// Create a log notifier for `channel`.
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(
        &self,
        recipient: &Recipient,
        context: &TemplateContext,
    ) -> Result<(), DeliveryError> {
        let to = recipient
            .address(self.channel)
            .ok_or(DeliveryError::MissingAddress(self.channel))?;
        let message = render(self.channel, context);
        info!(
            channel = %self.channel,
            to,
            subject = message.subject.as_deref().unwrap_or(""),
            body = %message.body,
            "Reminder (dry run)"
        );
        Ok(())
    }
}
