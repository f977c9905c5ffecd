//! Alert dispatch configuration.

use serde::{Deserialize, Serialize};

/// How the per-subscription notification quota is windowed.
///
/// `Lifetime` counts every successful send the subscription ever had.
/// `Monthly` and `Annual` only count sends since the start of the current
/// calendar month or year, evaluated in the dispatch UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaCycle {
    /// Never resets.
    #[default]
    Lifetime,
    /// Resets on the first day of each calendar month.
    Monthly,
    /// Resets on January 1st.
    Annual,
}

/// Settings shared by the periodic sweep and manual broadcasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// How many days ahead the sweep looks for due events (inclusive).
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Reminder offsets used when an event carries none.
    #[serde(default = "default_offsets")]
    pub default_offsets: Vec<u32>,
    /// Upper bound for a single notifier call.
    #[serde(default = "default_notifier_timeout")]
    pub notifier_timeout_seconds: u64,
    /// Candidates dispatched in parallel for one event.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Maximum diagnostic strings kept in a dispatch report.
    #[serde(default = "default_max_error_entries")]
    pub max_error_entries: usize,
    /// Offset from UTC used to decide what "today" is. Brasília is `-3`.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    /// Quota reset policy.
    #[serde(default)]
    pub quota_cycle: QuotaCycle,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            default_offsets: default_offsets(),
            notifier_timeout_seconds: default_notifier_timeout(),
            concurrency: default_concurrency(),
            max_error_entries: default_max_error_entries(),
            utc_offset_hours: default_utc_offset_hours(),
            quota_cycle: QuotaCycle::default(),
        }
    }
}

fn default_window_days() -> u32 {
    30
}

fn default_offsets() -> Vec<u32> {
    vec![1, 3, 7]
}

fn default_notifier_timeout() -> u64 {
    10
}

fn default_concurrency() -> usize {
    8
}

fn default_max_error_entries() -> usize {
    50
}

fn default_utc_offset_hours() -> i32 {
    -3
}
