//! Exam event category enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of milestone in an exam program's calendar.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "event_category", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EventCategory {
    /// Registration window opens.
    RegistrationOpen,
    /// The exam itself.
    ExamSitting,
    /// Results are published.
    Results,
    /// Waitlist / second call.
    WaitlistCall,
    /// Appeal period.
    Appeal,
    /// Enrollment of approved candidates.
    Enrollment,
    /// Anything else.
    Other,
}

impl EventCategory {
    /// Every category, in calendar order.
    pub const ALL: [EventCategory; 7] = [
        Self::RegistrationOpen,
        Self::ExamSitting,
        Self::Results,
        Self::WaitlistCall,
        Self::Appeal,
        Self::Enrollment,
        Self::Other,
    ];

    /// Return the category as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegistrationOpen => "registration-open",
            Self::ExamSitting => "exam-sitting",
            Self::Results => "results",
            Self::WaitlistCall => "waitlist-call",
            Self::Appeal => "appeal",
            Self::Enrollment => "enrollment",
            Self::Other => "other",
        }
    }

    /// Portuguese label shown to students.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RegistrationOpen => "Inscrição",
            Self::ExamSitting => "Prova",
            Self::Results => "Resultado",
            Self::WaitlistCall => "Segunda Chamada",
            Self::Appeal => "Recurso",
            Self::Enrollment => "Matrícula",
            Self::Other => "Outro",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = vestibulare_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                vestibulare_core::AppError::validation(format!("Invalid event category: '{s}'"))
            })
    }
}
