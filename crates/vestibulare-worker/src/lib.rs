//! Scheduled jobs for VestibulaRe.
//!
//! This crate provides:
//! - A job executor that runs named jobs and classifies their failures
//! - A cron scheduler that triggers the executor on configured schedules
//! - The daily alert sweep and the plan-expiry hygiene job

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use scheduler::CronScheduler;
