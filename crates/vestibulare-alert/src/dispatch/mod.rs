//! Dispatch Engine (periodic sweep) and Manual Broadcast.

pub mod engine;
pub mod report;

pub use engine::DispatchEngine;
pub use report::DispatchReport;
