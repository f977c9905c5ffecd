//! User profile entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use vestibulare_core::types::UserId;

use super::tier::PlanTier;
use crate::subscription::Channel;

/// Name used in messages when the user never filled one in.
pub const FALLBACK_DISPLAY_NAME: &str = "estudante";

/// A registered user, as seen by the alert engine.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    /// User identifier.
    pub id: UserId,
    /// Contact e-mail.
    pub email: String,
    /// Full name.
    pub full_name: Option<String>,
    /// Phone number in E.164.
    pub phone: Option<String>,
    /// Current plan tier.
    pub plan_tier: PlanTier,
    /// When a paid tier lapses; `None` for non-expiring tiers.
    pub plan_expires_at: Option<DateTime<Utc>>,
    /// Operator flag.
    pub is_admin: bool,
    /// Whether the e-mail address was confirmed.
    pub email_verified: bool,
    /// Whether the phone number was confirmed.
    pub phone_verified: bool,
    /// Whether the WhatsApp opt-in was confirmed.
    pub whatsapp_verified: bool,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
    /// When the profile was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// First name, or a neutral fallback.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
    }

    /// Whether the plan expiry has passed at `now`.
    pub fn plan_expired(&self, now: DateTime<Utc>) -> bool {
        self.plan_expires_at.is_some_and(|at| at < now)
    }

    /// Whether the profile carries what `channel` needs to deliver.
    pub fn can_receive(&self, channel: Channel) -> bool {
        if channel.requires_phone()
            && !self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
        {
            return false;
        }
        match channel {
            Channel::Email => !self.email.trim().is_empty(),
            Channel::Sms => true,
            Channel::Whatsapp => self.whatsapp_verified,
        }
    }
}
