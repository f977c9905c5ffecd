//! Exam program entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use vestibulare_core::types::ExamProgramId;

/// A named entrance-exam process (one vestibular, e.g. ENEM or FUVEST).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExamProgram {
    /// Unique program identifier.
    pub id: ExamProgramId,
    /// Display name.
    pub name: String,
    /// URL-safe unique slug.
    pub slug: String,
    /// Official website of the exam.
    pub official_url: Option<String>,
    /// Whether the program is still listed.
    pub active: bool,
    /// When the program was created.
    pub created_at: DateTime<Utc>,
    /// When the program was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create an exam program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExamProgram {
    /// Display name.
    pub name: String,
    /// URL-safe unique slug.
    pub slug: String,
    /// Official website.
    pub official_url: Option<String>,
}
