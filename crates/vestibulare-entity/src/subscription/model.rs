//! Subscription entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use vestibulare_core::types::{ExamProgramId, SubscriptionId, UserId};
use vestibulare_core::{AppError, AppResult};

use super::channel::Channel;
use crate::event::EventCategory;

/// A user's standing request to be reminded about one exam program.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    /// Unique subscription identifier.
    pub id: SubscriptionId,
    /// Subscribing user.
    pub user_id: UserId,
    /// Followed exam program.
    pub exam_program_id: ExamProgramId,
    /// Channels the user selected.
    pub channels: Vec<Channel>,
    /// Categories the user cares about; `None` or empty means all.
    pub category_filter: Option<Vec<EventCategory>>,
    /// Inactive subscriptions never produce candidates.
    pub active: bool,
    /// When the subscription was created.
    pub created_at: DateTime<Utc>,
    /// When the subscription was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether the user selected this channel.
    pub fn includes_channel(&self, channel: Channel) -> bool {
        self.channels.contains(&channel)
    }

    /// Whether the user's category filter lets this category through.
    pub fn accepts_category(&self, category: EventCategory) -> bool {
        match &self.category_filter {
            None => true,
            Some(filter) if filter.is_empty() => true,
            Some(filter) => filter.contains(&category),
        }
    }
}

/// Data required to create a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubscription {
    /// Subscribing user.
    pub user_id: UserId,
    /// Followed exam program.
    pub exam_program_id: ExamProgramId,
    /// Selected channels.
    pub channels: Vec<Channel>,
    /// Optional category filter.
    pub category_filter: Option<Vec<EventCategory>>,
}

impl NewSubscription {
    /// A subscription must select at least one channel, each at most once.
    pub fn validate(&self) -> AppResult<()> {
        if self.channels.is_empty() {
            return Err(AppError::validation(
                "A subscription needs at least one channel",
            ));
        }
        let mut seen = self.channels.clone();
        seen.sort();
        seen.dedup();
        if seen.len() != self.channels.len() {
            return Err(AppError::validation("Channels must not repeat"));
        }
        Ok(())
    }
}
