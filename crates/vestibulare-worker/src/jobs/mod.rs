//! Built-in scheduled jobs.

pub mod expiration;
pub mod sweep;

pub use expiration::PlanExpirationJob;
pub use sweep::AlertSweepJob;
