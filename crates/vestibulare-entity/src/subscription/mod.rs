//! Subscription entities.

pub mod channel;
pub mod model;

pub use channel::Channel;
pub use model::{NewSubscription, Subscription};
