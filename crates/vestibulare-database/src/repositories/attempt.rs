//! Notification attempt repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vestibulare_core::error::{AppError, ErrorKind};
use vestibulare_core::result::AppResult;
use vestibulare_core::types::{AttemptId, ExamEventId, SubscriptionId};
use vestibulare_entity::attempt::{AttemptOutcome, NewAttempt};
use vestibulare_entity::subscription::Channel;

use crate::store::{AppendOutcome, AttemptStore};

/// Repository for the append-only notification ledger.
#[derive(Debug, Clone)]
pub struct AttemptRepository {
    pool: PgPool,
}

impl AttemptRepository {
    /// Create a new attempt repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttemptStore for AttemptRepository {
    async fn append(&self, attempt: NewAttempt) -> AppResult<AppendOutcome> {
        // The partial unique index only covers `sent` rows, so failed rows
        // never conflict.
        let result = sqlx::query(
            "INSERT INTO notification_attempts \
             (id, subscription_id, event_id, channel, outcome, attempted_at, error_message) \
             VALUES ($1, $2, $3, $4, $5, NOW(), $6) \
             ON CONFLICT (subscription_id, event_id, channel) WHERE outcome = 'sent' DO NOTHING",
        )
        .bind(AttemptId::new())
        .bind(attempt.subscription_id)
        .bind(attempt.event_id)
        .bind(attempt.channel)
        .bind(attempt.outcome)
        .bind(&attempt.error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record notification attempt", e)
        })?;

        if result.rows_affected() == 0 {
            Ok(AppendOutcome::DuplicateSent)
        } else {
            Ok(AppendOutcome::Inserted)
        }
    }

    async fn has_sent(
        &self,
        subscription: SubscriptionId,
        event: ExamEventId,
        channel: Channel,
    ) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM notification_attempts \
             WHERE subscription_id = $1 AND event_id = $2 AND channel = $3 AND outcome = $4)",
        )
        .bind(subscription)
        .bind(event)
        .bind(channel)
        .bind(AttemptOutcome::Sent)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check ledger", e))
    }

    async fn count_sent(
        &self,
        subscription: SubscriptionId,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification_attempts \
             WHERE subscription_id = $1 AND outcome = $2 \
             AND ($3::timestamptz IS NULL OR attempted_at >= $3)",
        )
        .bind(subscription)
        .bind(AttemptOutcome::Sent)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count sent attempts", e))?;
        Ok(count.max(0) as u64)
    }
}
