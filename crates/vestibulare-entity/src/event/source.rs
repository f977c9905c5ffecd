//! Provenance of an exam event.

use serde::{Deserialize, Serialize};

/// Where an exam event's date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "date_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DateSource {
    /// Entered by an operator.
    Manual,
    /// Extracted by a scraper connector.
    Scraped,
}
