//! PostgreSQL implementations of the store traits.

pub mod attempt;
pub mod event;
pub mod profile;
pub mod program;
pub mod subscription;

pub use attempt::AttemptRepository;
pub use event::EventRepository;
pub use profile::ProfileRepository;
pub use program::ProgramRepository;
pub use subscription::SubscriptionRepository;
