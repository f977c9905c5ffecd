//! The guard itself.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use vestibulare_entity::event::ExamEvent;
use vestibulare_entity::profile::Profile;
use vestibulare_entity::subscription::{Channel, Subscription};

use crate::plan::PlanTable;

/// Why a candidate was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenyReason {
    /// The tier does not include the channel.
    TierRestrictedChannel,
    /// The subscription did not select the channel.
    SubscriptionRestrictedChannel,
    /// The tier does not include the event category.
    TierRestrictedCategory,
    /// The subscription's own filter excludes the event category.
    SubscriptionRestrictedCategory,
    /// The subscription used up its notifications for the cycle.
    QuotaExceeded,
}

impl DenyReason {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TierRestrictedChannel => "tier-restricted-channel",
            Self::SubscriptionRestrictedChannel => "subscription-restricted-channel",
            Self::TierRestrictedCategory => "tier-restricted-category",
            Self::SubscriptionRestrictedCategory => "subscription-restricted-category",
            Self::QuotaExceeded => "quota-exceeded",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an entitlement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The notification may go out.
    Allow,
    /// The notification must not go out.
    Deny(DenyReason),
}

impl Decision {
    /// Whether the decision is [`Decision::Allow`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Pure allow/deny decisions against the plan table.
#[derive(Debug, Clone)]
pub struct EntitlementGuard {
    plans: Arc<PlanTable>,
}

impl EntitlementGuard {
    /// Create a guard over `plans`.
    pub fn new(plans: Arc<PlanTable>) -> Self {
        Self { plans }
    }

    /// The plan table in use.
    pub fn plans(&self) -> &PlanTable {
        &self.plans
    }

    /// Decide whether `profile` may be notified about `event` over `channel`.
    ///
    /// `sent_in_cycle` is the number of successful notifications already
    /// counted against the subscription in the current quota cycle,
    /// including any reserved by candidates selected earlier in the same
    /// run. Checks short-circuit in order: channel, category, quota.
    pub fn permits(
        &self,
        profile: &Profile,
        subscription: &Subscription,
        event: &ExamEvent,
        channel: Channel,
        sent_in_cycle: u64,
        now: DateTime<Utc>,
    ) -> Decision {
        let policy = self.plans.effective_policy(profile, now);

        if !policy.allows_channel(channel) {
            return Decision::Deny(DenyReason::TierRestrictedChannel);
        }
        if !subscription.includes_channel(channel) {
            return Decision::Deny(DenyReason::SubscriptionRestrictedChannel);
        }
        if !policy.allows_category(event.category) {
            return Decision::Deny(DenyReason::TierRestrictedCategory);
        }
        if !subscription.accepts_category(event.category) {
            return Decision::Deny(DenyReason::SubscriptionRestrictedCategory);
        }
        if !policy.has_quota_for(sent_in_cycle) {
            return Decision::Deny(DenyReason::QuotaExceeded);
        }
        Decision::Allow
    }
}
