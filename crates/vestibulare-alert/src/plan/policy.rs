//! One row of the plan table.

use std::collections::BTreeSet;

use serde::Serialize;

use vestibulare_core::config::PlanConfig;
use vestibulare_core::error::AppError;
use vestibulare_core::result::AppResult;
use vestibulare_entity::event::EventCategory;
use vestibulare_entity::profile::PlanTier;
use vestibulare_entity::subscription::Channel;

/// Entitlements granted by one plan tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanPolicy {
    /// Tier name.
    pub tier: PlanTier,
    /// How many exam programs a user may follow.
    pub max_programs: u32,
    /// Successful notifications per subscription per quota cycle.
    pub max_notifications_per_cycle: u32,
    /// Channels the tier may use.
    pub channels: BTreeSet<Channel>,
    /// Categories the tier may be notified about; `None` means all.
    pub categories: Option<BTreeSet<EventCategory>>,
}

impl PlanPolicy {
    /// Parse a configured row.
    pub fn from_config(tier: &str, row: &PlanConfig) -> AppResult<Self> {
        let channels = row
            .channels
            .iter()
            .map(|c| c.parse::<Channel>())
            .collect::<AppResult<BTreeSet<_>>>()
            .map_err(|e| AppError::configuration(format!("plans.tiers.{tier}: {}", e.message)))?;
        if channels.is_empty() {
            return Err(AppError::configuration(format!(
                "plans.tiers.{tier} must allow at least one channel"
            )));
        }

        let categories = row
            .categories
            .as_ref()
            .map(|list| {
                list.iter()
                    .map(|c| c.parse::<EventCategory>())
                    .collect::<AppResult<BTreeSet<_>>>()
            })
            .transpose()
            .map_err(|e| AppError::configuration(format!("plans.tiers.{tier}: {}", e.message)))?;

        Ok(Self {
            tier: PlanTier::new(tier),
            max_programs: row.max_programs,
            max_notifications_per_cycle: row.max_notifications_per_cycle,
            channels,
            categories,
        })
    }

    /// Whether the tier may deliver over `channel`.
    pub fn allows_channel(&self, channel: Channel) -> bool {
        self.channels.contains(&channel)
    }

    /// Whether the tier may be notified about `category`.
    pub fn allows_category(&self, category: EventCategory) -> bool {
        self.categories
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&category))
    }

    /// Whether another notification fits after `used` in this cycle.
    pub fn has_quota_for(&self, used: u64) -> bool {
        used < u64::from(self.max_notifications_per_cycle)
    }
}
