//! Exam program repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use vestibulare_core::error::{AppError, ErrorKind};
use vestibulare_core::result::AppResult;
use vestibulare_core::types::ExamProgramId;
use vestibulare_entity::program::{CreateExamProgram, ExamProgram};

use crate::store::ProgramStore;

/// Repository for exam programs.
#[derive(Debug, Clone)]
pub struct ProgramRepository {
    pool: PgPool,
}

impl ProgramRepository {
    /// Create a new program repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgramStore for ProgramRepository {
    async fn find_program(&self, id: ExamProgramId) -> AppResult<Option<ExamProgram>> {
        sqlx::query_as::<_, ExamProgram>("SELECT * FROM exam_programs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to load exam program", e)
            })
    }

    async fn create_program(&self, input: CreateExamProgram) -> AppResult<ExamProgram> {
        sqlx::query_as::<_, ExamProgram>(
            "INSERT INTO exam_programs (id, name, slug, official_url) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(ExamProgramId::new())
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.official_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::with_source(
                ErrorKind::Conflict,
                format!("Exam program slug '{}' already exists", input.slug),
                e,
            ),
            other => AppError::with_source(
                ErrorKind::Database,
                "Failed to create exam program",
                other,
            ),
        })
    }
}
