//! Storage capabilities consumed by the alert engine.
//!
//! Each trait is object-safe so the engine can hold `Arc<dyn ...>` handles
//! and run unchanged against PostgreSQL or the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use vestibulare_core::result::AppResult;
use vestibulare_core::types::{ExamEventId, ExamProgramId, SubscriptionId, UserId};
use vestibulare_entity::attempt::NewAttempt;
use vestibulare_entity::event::{CreateExamEvent, ExamEvent};
use vestibulare_entity::profile::{PlanTier, Profile};
use vestibulare_entity::program::{CreateExamProgram, ExamProgram};
use vestibulare_entity::subscription::{Channel, NewSubscription, Subscription};

use crate::memory::MemoryStore;
use crate::repositories::{
    AttemptRepository, EventRepository, ProfileRepository, ProgramRepository,
    SubscriptionRepository,
};

/// Result of appending an attempt to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The row was written.
    Inserted,
    /// A `sent` row for the same triple already existed; nothing was written.
    DuplicateSent,
}

/// Read and create exam events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Load one event.
    async fn find_event(&self, id: ExamEventId) -> AppResult<Option<ExamEvent>>;

    /// Events whose primary date lies in `[from, to]`, earliest first.
    async fn find_events_between(&self, from: NaiveDate, to: NaiveDate)
    -> AppResult<Vec<ExamEvent>>;

    /// Persist a new event.
    async fn create_event(&self, input: CreateExamEvent) -> AppResult<ExamEvent>;
}

/// Read and create exam programs.
#[async_trait]
pub trait ProgramStore: Send + Sync {
    /// Load one program.
    async fn find_program(&self, id: ExamProgramId) -> AppResult<Option<ExamProgram>>;

    /// Persist a new program.
    async fn create_program(&self, input: CreateExamProgram) -> AppResult<ExamProgram>;
}

/// Read and create subscriptions.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Active subscriptions following `program`.
    async fn find_active_by_program(&self, program: ExamProgramId)
    -> AppResult<Vec<Subscription>>;

    /// Number of subscriptions a user holds, active or not.
    async fn count_by_user(&self, user: UserId) -> AppResult<u64>;

    /// Persist a new subscription; `Conflict` if the user already follows the program.
    async fn create_subscription(&self, input: NewSubscription) -> AppResult<Subscription>;
}

/// Read user profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load one profile.
    async fn find_profile(&self, id: UserId) -> AppResult<Option<Profile>>;

    /// Load many profiles; missing ids are silently absent from the result.
    async fn find_profiles(&self, ids: &[UserId]) -> AppResult<Vec<Profile>>;

    /// Move every profile whose plan lapsed before `now` onto `tier` and
    /// clear its expiry. Returns the number of profiles changed.
    async fn downgrade_expired(&self, now: DateTime<Utc>, tier: &PlanTier) -> AppResult<u64>;
}

/// Append-only notification ledger.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Append an attempt. A second `sent` row for the same triple is
    /// rejected as [`AppendOutcome::DuplicateSent`] rather than an error.
    async fn append(&self, attempt: NewAttempt) -> AppResult<AppendOutcome>;

    /// Whether a `sent` row exists for the triple.
    async fn has_sent(
        &self,
        subscription: SubscriptionId,
        event: ExamEventId,
        channel: Channel,
    ) -> AppResult<bool>;

    /// Number of `sent` rows for a subscription, all events and channels,
    /// optionally only those at or after `since`.
    async fn count_sent(
        &self,
        subscription: SubscriptionId,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<u64>;
}

/// Bundle of store handles shared by the engine, jobs and handlers.
#[derive(Clone)]
pub struct Stores {
    /// Exam events.
    pub events: Arc<dyn EventStore>,
    /// Exam programs.
    pub programs: Arc<dyn ProgramStore>,
    /// Subscriptions.
    pub subscriptions: Arc<dyn SubscriptionStore>,
    /// Profiles.
    pub profiles: Arc<dyn ProfileStore>,
    /// Notification ledger.
    pub attempts: Arc<dyn AttemptStore>,
}

impl Stores {
    /// Postgres-backed stores sharing one pool.
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            events: Arc::new(EventRepository::new(pool.clone())),
            programs: Arc::new(ProgramRepository::new(pool.clone())),
            subscriptions: Arc::new(SubscriptionRepository::new(pool.clone())),
            profiles: Arc::new(ProfileRepository::new(pool.clone())),
            attempts: Arc::new(AttemptRepository::new(pool)),
        }
    }

    /// Every store served by one shared in-memory instance.
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            events: store.clone(),
            programs: store.clone(),
            subscriptions: store.clone(),
            profiles: store.clone(),
            attempts: store,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
