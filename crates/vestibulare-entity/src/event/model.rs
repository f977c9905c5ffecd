//! Exam event entity model.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use vestibulare_core::types::{ExamEventId, ExamProgramId};

use super::category::EventCategory;
use super::source::DateSource;

/// One scheduled milestone of one exam program.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExamEvent {
    /// Unique event identifier.
    pub id: ExamEventId,
    /// Owning exam program.
    pub exam_program_id: ExamProgramId,
    /// Milestone category.
    pub category: EventCategory,
    /// Human label, e.g. "Prova do 1º dia".
    pub label: String,
    /// Primary date.
    pub event_date: NaiveDate,
    /// Last day of a multi-day milestone.
    pub end_date: Option<NaiveDate>,
    /// Days before `event_date` at which reminders fire.
    pub alert_days_before: Vec<i32>,
    /// Official page for this milestone, if different from the program's.
    pub official_url: Option<String>,
    /// Free-form operator notes.
    pub notes: Option<String>,
    /// Provenance.
    pub source: DateSource,
    /// When the event was created.
    pub created_at: DateTime<Utc>,
    /// When the event was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ExamEvent {
    /// Whole calendar days from `today` to the event date.
    ///
    /// Negative once the event is in the past.
    pub fn days_until(&self, today: NaiveDate) -> i64 {
        (self.event_date - today).num_days()
    }

    /// Reminder offsets in effect for this event.
    ///
    /// Negative values are ignored; an empty (or all-negative) list falls
    /// back to `defaults`.
    pub fn effective_offsets(&self, defaults: &[u32]) -> BTreeSet<u32> {
        let offsets: BTreeSet<u32> = self
            .alert_days_before
            .iter()
            .filter_map(|d| u32::try_from(*d).ok())
            .collect();
        if offsets.is_empty() {
            defaults.iter().copied().collect()
        } else {
            offsets
        }
    }

    /// Whether a reminder is scheduled for `today`.
    pub fn is_due_on(&self, today: NaiveDate, defaults: &[u32]) -> bool {
        u32::try_from(self.days_until(today))
            .map(|days| self.effective_offsets(defaults).contains(&days))
            .unwrap_or(false)
    }
}

/// Data required to create an exam event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExamEvent {
    /// Owning exam program.
    pub exam_program_id: ExamProgramId,
    /// Milestone category.
    pub category: EventCategory,
    /// Human label.
    pub label: String,
    /// Primary date.
    pub event_date: NaiveDate,
    /// Optional end date.
    pub end_date: Option<NaiveDate>,
    /// Reminder offsets; empty means the dispatch defaults.
    pub alert_days_before: Vec<i32>,
    /// Official page.
    pub official_url: Option<String>,
    /// Provenance.
    pub source: DateSource,
}

impl CreateExamEvent {
    /// Reject negative offsets and an end date before the primary date.
    pub fn validate(&self) -> vestibulare_core::AppResult<()> {
        if let Some(bad) = self.alert_days_before.iter().find(|d| **d < 0) {
            return Err(vestibulare_core::AppError::validation(format!(
                "Reminder offsets must be non-negative, got {bad}"
            )));
        }
        if self.end_date.is_some_and(|end| end < self.event_date) {
            return Err(vestibulare_core::AppError::validation(
                "End date precedes the event date",
            ));
        }
        Ok(())
    }
}
