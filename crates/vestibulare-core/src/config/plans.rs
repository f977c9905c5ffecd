//! Subscription plan table configuration.
//!
//! Channel and category names are kept as strings here; the alert crate
//! parses and validates them into a typed plan table at startup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Entitlements of one subscription tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Maximum number of exam programs a user may subscribe to.
    pub max_programs: u32,
    /// Maximum successful notifications per subscription per quota cycle.
    pub max_notifications_per_cycle: u32,
    /// Channels the tier may use.
    pub channels: Vec<String>,
    /// Event categories the tier may be notified about. Absent means all.
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

/// The full plan table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlansConfig {
    /// Tier applied to unknown tiers and to paid tiers past their expiry.
    #[serde(default = "default_restricted_tier")]
    pub restricted_tier: String,
    /// Tier name to entitlements.
    #[serde(default = "default_tiers")]
    pub tiers: BTreeMap<String, PlanConfig>,
}

impl Default for PlansConfig {
    fn default() -> Self {
        Self {
            restricted_tier: default_restricted_tier(),
            tiers: default_tiers(),
        }
    }
}

fn default_restricted_tier() -> String {
    "free".to_string()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_tiers() -> BTreeMap<String, PlanConfig> {
    let mut tiers = BTreeMap::new();
    tiers.insert(
        "free".to_string(),
        PlanConfig {
            max_programs: 1,
            max_notifications_per_cycle: 10,
            channels: strings(&["whatsapp"]),
            categories: Some(strings(&["registration-open", "exam-sitting"])),
        },
    );
    tiers.insert(
        "basic".to_string(),
        PlanConfig {
            max_programs: 10,
            max_notifications_per_cycle: 200,
            channels: strings(&["email", "sms", "whatsapp"]),
            categories: None,
        },
    );
    tiers.insert(
        "premium".to_string(),
        PlanConfig {
            max_programs: 20,
            max_notifications_per_cycle: 1000,
            channels: strings(&["email", "sms", "whatsapp"]),
            categories: None,
        },
    );
    tiers
}
