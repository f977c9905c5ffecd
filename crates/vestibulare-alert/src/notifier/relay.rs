//! Notifier that posts rendered messages to an HTTP relay.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use vestibulare_entity::subscription::Channel;

use super::template::{RenderedMessage, TemplateContext, render};
use super::{DeliveryError, Notifier, Recipient};

/// JSON body sent to the relay.
#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    channel: Channel,
    to: &'a str,
    #[serde(flatten)]
    message: RenderedMessage,
    context: &'a TemplateContext,
}

/// Delivers through an external relay that owns the vendor transports.
#[derive(Debug, Clone)]
pub struct RelayNotifier {
    client: reqwest::Client,
    channel: Channel,
    url: String,
    token: String,
}

impl RelayNotifier {
    /// Create a relay notifier for `channel` posting to `url`.
    ///
    /// An empty `token` sends no `Authorization` header.
    pub fn new(client: reqwest::Client, channel: Channel, url: String, token: String) -> Self {
        Self {
            client,
            channel,
            url,
            token,
        }
    }
}

#[async_trait]
impl Notifier for RelayNotifier {
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
        let payload = RelayPayload {
            channel: self.channel,
            to,
            message: render(self.channel, context),
            context,
        };

        let mut request = self.client.post(&self.url).json(&payload);
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected(format!(
                "relay responded {status}: {}",
                detail.trim()
            )));
        }

        debug!(channel = %self.channel, %status, "Relay accepted reminder");
        Ok(())
    }
}
