//! Exam event repository implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use vestibulare_core::error::{AppError, ErrorKind};
use vestibulare_core::result::AppResult;
use vestibulare_core::types::ExamEventId;
use vestibulare_entity::event::{CreateExamEvent, ExamEvent};

use crate::store::EventStore;

/// Repository for exam events.
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new event repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for EventRepository {
    async fn find_event(&self, id: ExamEventId) -> AppResult<Option<ExamEvent>> {
        sqlx::query_as::<_, ExamEvent>("SELECT * FROM exam_events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load exam event", e))
    }

    async fn find_events_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<ExamEvent>> {
        sqlx::query_as::<_, ExamEvent>(
            "SELECT * FROM exam_events WHERE event_date BETWEEN $1 AND $2 \
             ORDER BY event_date ASC, id ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load due exam events", e))
    }

    async fn create_event(&self, input: CreateExamEvent) -> AppResult<ExamEvent> {
        input.validate()?;
        sqlx::query_as::<_, ExamEvent>(
            "INSERT INTO exam_events \
             (id, exam_program_id, category, label, event_date, end_date, alert_days_before, official_url, source) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(ExamEventId::new())
        .bind(input.exam_program_id)
        .bind(input.category)
        .bind(&input.label)
        .bind(input.event_date)
        .bind(input.end_date)
        .bind(&input.alert_days_before)
        .bind(&input.official_url)
        .bind(input.source)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create exam event", e))
    }
}
