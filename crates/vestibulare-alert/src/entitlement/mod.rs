//! Entitlement Guard: may this user be notified about this event over this channel?

pub mod cycle;
pub mod guard;

pub use cycle::cycle_start;
pub use guard::{Decision, DenyReason, EntitlementGuard};
