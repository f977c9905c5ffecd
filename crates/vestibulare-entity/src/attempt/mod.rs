//! Notification attempt entities.

pub mod model;
pub mod outcome;

pub use model::{NewAttempt, NotificationAttempt};
pub use outcome::AttemptOutcome;
