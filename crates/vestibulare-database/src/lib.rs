//! # vestibulare-database
//!
//! PostgreSQL connection management, the store traits the alert engine
//! depends on, their Postgres repositories, and an in-memory store with
//! the same uniqueness guarantees.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{
    AppendOutcome, AttemptStore, EventStore, ProfileStore, ProgramStore, Stores,
    SubscriptionStore,
};
