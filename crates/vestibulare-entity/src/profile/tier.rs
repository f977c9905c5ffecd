//! Plan tier name.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the plan tier a user is on.
///
/// Tiers are configuration, not code, so the name is kept as an opaque
/// string and resolved against the configured plan table at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PlanTier(pub String);

impl PlanTier {
    /// Build a tier from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_lowercase())
    }

    /// The tier name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlanTier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
