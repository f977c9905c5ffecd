//! User profile entities.

pub mod model;
pub mod tier;

pub use model::Profile;
pub use tier::PlanTier;
