//! Outbound notifier configuration.

use serde::{Deserialize, Serialize};

/// Which transport the notifier registry is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierMode {
    /// Render and log messages without delivering them.
    #[default]
    Log,
    /// POST rendered messages to an external relay service.
    Relay,
}

/// Notifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Transport mode.
    #[serde(default)]
    pub mode: NotifierMode,
    /// Relay endpoint; the channel name is appended as a path segment.
    #[serde(default)]
    pub relay_url: String,
    /// Optional bearer token sent to the relay.
    #[serde(default)]
    pub relay_token: String,
    /// Channels with a registered notifier. Channels left out are never sent.
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            mode: NotifierMode::default(),
            relay_url: String::new(),
            relay_token: String::new(),
            channels: default_channels(),
        }
    }
}

fn default_channels() -> Vec<String> {
    vec!["email".to_string(), "sms".to_string(), "whatsapp".to_string()]
}
