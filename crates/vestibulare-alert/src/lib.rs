//! # vestibulare-alert
//!
//! The alert dispatch engine: plan policy, entitlement guard, dedup
//! ledger, alert matcher, the periodic sweep and the manual broadcast,
//! plus the channel notifier capability they deliver through.
//!
//! Data flows sweep → matcher (per due event) → guard (per candidate) →
//! notifier → ledger. Broadcast reuses everything but the offset gate.

pub mod clock;
pub mod dispatch;
pub mod enrollment;
pub mod entitlement;
pub mod ledger;
pub mod matcher;
pub mod notifier;
pub mod plan;

#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, FixedClock, SystemClock};
pub use dispatch::{DispatchEngine, DispatchReport};
pub use enrollment::Enrollment;
pub use entitlement::{Decision, DenyReason, EntitlementGuard};
pub use ledger::DedupLedger;
pub use matcher::{AlertMatcher, Candidate, OffsetGate, SkipReason};
pub use notifier::{DeliveryError, Notifier, NotifierRegistry, Recipient, TemplateContext};
pub use plan::{PlanPolicy, PlanTable};
