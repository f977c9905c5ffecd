//! Subscription repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use vestibulare_core::error::{AppError, ErrorKind};
use vestibulare_core::result::AppResult;
use vestibulare_core::types::{ExamProgramId, SubscriptionId, UserId};
use vestibulare_entity::subscription::{NewSubscription, Subscription};

use crate::store::SubscriptionStore;

/// Repository for subscriptions.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for SubscriptionRepository {
    async fn find_active_by_program(
        &self,
        program: ExamProgramId,
    ) -> AppResult<Vec<Subscription>> {
        sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE exam_program_id = $1 AND active \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(program)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load subscriptions", e)
        })
    }

    async fn count_by_user(&self, user: UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
            .bind(user)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count subscriptions", e)
            })?;
        Ok(count.max(0) as u64)
    }

    async fn create_subscription(&self, input: NewSubscription) -> AppResult<Subscription> {
        input.validate()?;
        sqlx::query_as::<_, Subscription>(
            "INSERT INTO subscriptions (id, user_id, exam_program_id, channels, category_filter) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(SubscriptionId::new())
        .bind(input.user_id)
        .bind(input.exam_program_id)
        .bind(&input.channels)
        .bind(&input.category_filter)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::with_source(
                ErrorKind::Conflict,
                "User already follows this exam program",
                e,
            ),
            other => {
                AppError::with_source(ErrorKind::Database, "Failed to create subscription", other)
            }
        })
    }
}
