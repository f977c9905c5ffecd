//! Profile repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vestibulare_core::error::{AppError, ErrorKind};
use vestibulare_core::result::AppResult;
use vestibulare_core::types::UserId;
use vestibulare_entity::profile::{PlanTier, Profile};

use crate::store::ProfileStore;

/// Repository for user profiles.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Create a new profile repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn find_profile(&self, id: UserId) -> AppResult<Option<Profile>> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load profile", e))
    }

    async fn find_profiles(&self, ids: &[UserId]) -> AppResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load profiles", e))
    }

    async fn downgrade_expired(&self, now: DateTime<Utc>, tier: &PlanTier) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE profiles SET plan_tier = $1, plan_expires_at = NULL, updated_at = NOW() \
             WHERE plan_expires_at IS NOT NULL AND plan_expires_at < $2",
        )
        .bind(tier)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to downgrade expired plans", e)
        })?;
        Ok(result.rows_affected())
    }
}
