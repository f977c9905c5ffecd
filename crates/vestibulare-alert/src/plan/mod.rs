//! Plan Policy: tier name → entitlements.

pub mod policy;
pub mod table;

pub use policy::PlanPolicy;
pub use table::PlanTable;
