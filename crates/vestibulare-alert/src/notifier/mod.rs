//! Channel notifier capability.
//!
//! One [`Notifier`] per channel renders a [`TemplateContext`] and hands it
//! to a transport. The engine never talks to transports directly.

pub mod log;
pub mod relay;
pub mod template;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use vestibulare_core::config::{NotifierConfig, NotifierMode};
use vestibulare_core::error::AppError;
use vestibulare_core::result::AppResult;
use vestibulare_core::types::UserId;
use vestibulare_entity::profile::Profile;
use vestibulare_entity::subscription::Channel;

pub use self::log::LogNotifier;
pub use self::relay::RelayNotifier;
pub use self::template::{RenderedMessage, TemplateContext};

/// Who a reminder goes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    /// User id.
    pub user_id: UserId,
    /// E-mail address.
    pub email: String,
    /// Phone number, if any.
    pub phone: Option<String>,
}

impl Recipient {
    /// Address for `channel`, if the recipient has one.
    pub fn address(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Email => Some(self.email.as_str()).filter(|e| !e.is_empty()),
            Channel::Sms | Channel::Whatsapp => self.phone.as_deref().filter(|p| !p.is_empty()),
        }
    }
}

impl From<&Profile> for Recipient {
    fn from(profile: &Profile) -> Self {
        Self {
            user_id: profile.id,
            email: profile.email.clone(),
            phone: profile.phone.clone(),
        }
    }
}

/// Why a delivery did not go through.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The recipient lacks an address for the channel.
    #[error("recipient has no {0} address")]
    MissingAddress(Channel),
    /// The transport refused the message.
    #[error("rejected: {0}")]
    Rejected(String),
    /// The transport could not be reached.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Delivers rendered reminders over one channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel served by this notifier.
    fn channel(&self) -> Channel;

    /// Deliver one reminder.
    async fn send(
        &self,
        recipient: &Recipient,
        context: &TemplateContext,
    ) -> Result<(), DeliveryError>;
}

/// Channel → notifier lookup.
#[derive(Clone, Default)]
pub struct NotifierRegistry {
    notifiers: HashMap<Channel, Arc<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `notifier` for its channel, replacing any previous one.
    pub fn register(&mut self, notifier: Arc<dyn Notifier>) {
        self.notifiers.insert(notifier.channel(), notifier);
    }

    /// Builder form of [`NotifierRegistry::register`].
    pub fn with(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.register(notifier);
        self
    }

    /// Notifier for `channel`, if configured.
    pub fn get(&self, channel: Channel) -> Option<Arc<dyn Notifier>> {
        self.notifiers.get(&channel).cloned()
    }

    /// Channels with a notifier.
    pub fn channels(&self) -> Vec<Channel> {
        let mut channels: Vec<_> = self.notifiers.keys().copied().collect();
        channels.sort();
        channels
    }

    /// Build the registry described by `config`.
    pub fn from_config(config: &NotifierConfig) -> AppResult<Self> {
        let channels = config
            .channels
            .iter()
            .map(|c| c.parse::<Channel>())
            .collect::<AppResult<Vec<_>>>()
            .map_err(|e| AppError::configuration(format!("notifier.channels: {}", e.message)))?;

        let mut registry = Self::new();
        match config.mode {
            NotifierMode::Log => {
                for channel in channels {
                    registry.register(Arc::new(LogNotifier::new(channel)));
                }
            }
            NotifierMode::Relay => {
                if config.relay_url.trim().is_empty() {
                    return Err(AppError::configuration(
                        "notifier.relay_url is required in relay mode",
                    ));
                }
                let client = reqwest::Client::new();
                for channel in channels {
                    registry.register(Arc::new(RelayNotifier::new(
                        client.clone(),
                        channel,
                        config.relay_url.clone(),
                        config.relay_token.clone(),
                    )));
                }
            }
        }

        info!(mode = ?config.mode, channels = ?registry.channels(), "Notifiers configured");
        Ok(registry)
    }
}

impl fmt::Debug for NotifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierRegistry")
            .field("channels", &self.channels())
            .finish()
    }
}
