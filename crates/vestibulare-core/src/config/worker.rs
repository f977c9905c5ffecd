//! Scheduled job configuration.

use serde::{Deserialize, Serialize};

/// Cron schedules for the periodic alert sweep and plan hygiene.
///
/// Expressions use the six-field `tokio-cron-scheduler` syntax
/// (`sec min hour day month weekday`) evaluated in UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether scheduled jobs run inside this process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Schedule of the alert sweep. Defaults to 12:00 UTC (09:00 in Brasília).
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
    /// Schedule of the expired-plan downgrade job.
    #[serde(default = "default_expiration_cron")]
    pub expiration_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_cron: default_sweep_cron(),
            expiration_cron: default_expiration_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sweep_cron() -> String {
    "0 0 12 * * *".to_string()
}

fn default_expiration_cron() -> String {
    "0 0 6 * * *".to_string()
}
