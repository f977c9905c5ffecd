//! Notification attempt entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use vestibulare_core::types::{AttemptId, ExamEventId, SubscriptionId};

use super::outcome::AttemptOutcome;
use crate::subscription::Channel;

/// Append-only record of one (subscription, event, channel) delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationAttempt {
    /// Unique attempt identifier.
    pub id: AttemptId,
    /// Subscription the reminder was for.
    pub subscription_id: SubscriptionId,
    /// Event the reminder was about.
    pub event_id: ExamEventId,
    /// Channel used.
    pub channel: Channel,
    /// Whether delivery succeeded.
    pub outcome: AttemptOutcome,
    /// When the attempt finished.
    pub attempted_at: DateTime<Utc>,
    /// Notifier error text for failed attempts.
    pub error_message: Option<String>,
}

/// Data required to append an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttempt {
    /// Subscription the reminder was for.
    pub subscription_id: SubscriptionId,
    /// Event the reminder was about.
    pub event_id: ExamEventId,
    /// Channel used.
    pub channel: Channel,
    /// Whether delivery succeeded.
    pub outcome: AttemptOutcome,
    /// Notifier error text for failed attempts.
    pub error_message: Option<String>,
}

impl NewAttempt {
    /// A successful attempt.
    pub fn sent(subscription_id: SubscriptionId, event_id: ExamEventId, channel: Channel) -> Self {
        Self {
            subscription_id,
            event_id,
            channel,
            outcome: AttemptOutcome::Sent,
            error_message: None,
        }
    }

    /// A failed attempt carrying the notifier's error text.
    pub fn failed(
        subscription_id: SubscriptionId,
        event_id: ExamEventId,
        channel: Channel,
        error: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id,
            event_id,
            channel,
            outcome: AttemptOutcome::Failed,
            error_message: Some(error.into()),
        }
    }

    /// Materialize the attempt with a fresh id.
    pub fn into_attempt(self, attempted_at: DateTime<Utc>) -> NotificationAttempt {
        NotificationAttempt {
            id: AttemptId::new(),
            subscription_id: self.subscription_id,
            event_id: self.event_id,
            channel: self.channel,
            outcome: self.outcome,
            attempted_at,
            error_message: self.error_message,
        }
    }
}
