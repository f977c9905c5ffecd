//! The full plan table, loaded once from configuration.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use vestibulare_core::config::PlansConfig;
use vestibulare_core::error::AppError;
use vestibulare_core::result::AppResult;
use vestibulare_entity::profile::{PlanTier, Profile};
use vestibulare_entity::subscription::Channel;

use super::policy::PlanPolicy;

/// Read-only tier → policy lookup.
///
/// Unknown tiers and lapsed paid tiers resolve to the restricted tier, never
/// to an unrestricted one.
#[derive(Debug, Clone)]
pub struct PlanTable {
    tiers: BTreeMap<PlanTier, PlanPolicy>,
    restricted: PlanPolicy,
}

impl PlanTable {
    /// Build and validate the table from configuration.
    pub fn from_config(config: &PlansConfig) -> AppResult<Self> {
        let mut tiers = BTreeMap::new();
        for (name, row) in &config.tiers {
            let policy = PlanPolicy::from_config(name, row)?;
            tiers.insert(policy.tier.clone(), policy);
        }

        let restricted_tier = PlanTier::new(config.restricted_tier.as_str());
        let restricted = tiers.get(&restricted_tier).cloned().ok_or_else(|| {
            AppError::configuration(format!(
                "plans.restricted_tier '{restricted_tier}' is not defined in plans.tiers"
            ))
        })?;

        Ok(Self { tiers, restricted })
    }

    /// Policy for `tier`; unknown tiers fail closed to the restricted tier.
    pub fn policy_for(&self, tier: &PlanTier) -> &PlanPolicy {
        match self.tiers.get(tier) {
            Some(policy) => policy,
            None => {
                warn!(tier = %tier, fallback = %self.restricted.tier, "Unknown plan tier");
                &self.restricted
            }
        }
    }

    /// Policy actually in force for `profile` at `now`.
    ///
    /// A plan whose expiry has passed is treated as the restricted tier for
    /// this decision only; nothing is written back.
    pub fn effective_policy(&self, profile: &Profile, now: DateTime<Utc>) -> &PlanPolicy {
        if profile.plan_expired(now) {
            &self.restricted
        } else {
            self.policy_for(&profile.plan_tier)
        }
    }

    /// The fallback policy.
    pub fn restricted(&self) -> &PlanPolicy {
        &self.restricted
    }

    /// Name of the fallback tier.
    pub fn restricted_tier(&self) -> &PlanTier {
        &self.restricted.tier
    }

    /// Whether a user on `tier` holding `current_count` subscriptions may add one more.
    pub fn can_add_subscription(&self, tier: &PlanTier, current_count: u64) -> bool {
        current_count < u64::from(self.policy_for(tier).max_programs)
    }

    /// Channels `tier` may deliver over, in stable order.
    pub fn available_channels(&self, tier: &PlanTier) -> Vec<Channel> {
        self.policy_for(tier).channels.iter().copied().collect()
    }

    /// Every configured tier.
    pub fn tiers(&self) -> impl Iterator<Item = &PlanPolicy> {
        self.tiers.values()
    }
}
