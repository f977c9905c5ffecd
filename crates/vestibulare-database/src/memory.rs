//! In-memory implementation of every store trait.
//!
//! Used by tests and dry runs. Enforces the same uniqueness rules as the
//! PostgreSQL schema: one subscription per (user, program) and at most one
//! `sent` attempt per (subscription, event, channel).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use vestibulare_core::error::AppError;
use vestibulare_core::result::AppResult;
use vestibulare_core::types::{ExamEventId, ExamProgramId, SubscriptionId, UserId};
use vestibulare_entity::attempt::{AttemptOutcome, NewAttempt, NotificationAttempt};
use vestibulare_entity::event::{CreateExamEvent, ExamEvent};
use vestibulare_entity::profile::{PlanTier, Profile};
use vestibulare_entity::program::{CreateExamProgram, ExamProgram};
use vestibulare_entity::subscription::{Channel, NewSubscription, Subscription};

use crate::store::{
    AppendOutcome, AttemptStore, EventStore, ProfileStore, ProgramStore, SubscriptionStore,
};

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<UserId, Profile>,
    programs: HashMap<ExamProgramId, ExamProgram>,
    events: HashMap<ExamEventId, ExamEvent>,
    subscriptions: HashMap<SubscriptionId, Subscription>,
    attempts: Vec<NotificationAttempt>,
}

/// Process-local store backed by hash maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_event_loads: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| AppError::internal("Memory store lock poisoned"))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| AppError::internal("Memory store lock poisoned"))
    }

    /// Insert or replace a profile.
    pub fn put_profile(&self, profile: Profile) -> AppResult<()> {
        self.write()?.profiles.insert(profile.id, profile);
        Ok(())
    }

    /// Insert or replace a program.
    pub fn put_program(&self, program: ExamProgram) -> AppResult<()> {
        self.write()?.programs.insert(program.id, program);
        Ok(())
    }

    /// Insert or replace an event.
    pub fn put_event(&self, event: ExamEvent) -> AppResult<()> {
        self.write()?.events.insert(event.id, event);
        Ok(())
    }

    /// Insert or replace a subscription, bypassing the (user, program) check.
    pub fn put_subscription(&self, subscription: Subscription) -> AppResult<()> {
        self.write()?
            .subscriptions
            .insert(subscription.id, subscription);
        Ok(())
    }

    /// Append a fully formed attempt, keeping its timestamp.
    pub fn put_attempt(&self, attempt: NotificationAttempt) -> AppResult<AppendOutcome> {
        let mut tables = self.write()?;
        Ok(push_attempt(&mut tables.attempts, attempt))
    }

    /// Snapshot of the ledger in insertion order.
    pub fn attempts(&self) -> AppResult<Vec<NotificationAttempt>> {
        Ok(self.read()?.attempts.clone())
    }

    /// Snapshot of one profile.
    pub fn profile(&self, id: UserId) -> AppResult<Option<Profile>> {
        Ok(self.read()?.profiles.get(&id).cloned())
    }

    /// Make subsequent due-event loads fail, simulating an unreachable database.
    pub fn set_fail_event_loads(&self, fail: bool) {
        self.fail_event_loads.store(fail, Ordering::SeqCst);
    }
}

fn push_attempt(ledger: &mut Vec<NotificationAttempt>, attempt: NotificationAttempt) -> AppendOutcome {
    if attempt.outcome == AttemptOutcome::Sent
        && ledger.iter().any(|a| {
            a.outcome == AttemptOutcome::Sent
                && a.subscription_id == attempt.subscription_id
                && a.event_id == attempt.event_id
                && a.channel == attempt.channel
        })
    {
        return AppendOutcome::DuplicateSent;
    }
    ledger.push(attempt);
    AppendOutcome::Inserted
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn find_event(&self, id: ExamEventId) -> AppResult<Option<ExamEvent>> {
        Ok(self.read()?.events.get(&id).cloned())
    }

    async fn find_events_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<ExamEvent>> {
        if self.fail_event_loads.load(Ordering::SeqCst) {
            return Err(AppError::database("Failed to load due exam events"));
        }
        let mut events: Vec<ExamEvent> = self
            .read()?
            .events
            .values()
            .filter(|e| e.event_date >= from && e.event_date <= to)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.event_date.cmp(&b.event_date).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn create_event(&self, input: CreateExamEvent) -> AppResult<ExamEvent> {
        input.validate()?;
        let now = Utc::now();
        let event = ExamEvent {
            id: ExamEventId::new(),
            exam_program_id: input.exam_program_id,
            category: input.category,
            label: input.label,
            event_date: input.event_date,
            end_date: input.end_date,
            alert_days_before: input.alert_days_before,
            official_url: input.official_url,
            notes: None,
            source: input.source,
            created_at: now,
            updated_at: now,
        };
        self.put_event(event.clone())?;
        Ok(event)
    }
}

#[async_trait]
impl ProgramStore for MemoryStore {
    async fn find_program(&self, id: ExamProgramId) -> AppResult<Option<ExamProgram>> {
        Ok(self.read()?.programs.get(&id).cloned())
    }

    async fn create_program(&self, input: CreateExamProgram) -> AppResult<ExamProgram> {
        let mut tables = self.write()?;
        if tables.programs.values().any(|p| p.slug == input.slug) {
            return Err(AppError::conflict(format!(
                "Exam program slug '{}' already exists",
                input.slug
            )));
        }
        let now = Utc::now();
        let program = ExamProgram {
            id: ExamProgramId::new(),
            name: input.name,
            slug: input.slug,
            official_url: input.official_url,
            active: true,
            created_at: now,
            updated_at: now,
        };
        tables.programs.insert(program.id, program.clone());
        Ok(program)
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn find_active_by_program(
        &self,
        program: ExamProgramId,
    ) -> AppResult<Vec<Subscription>> {
        let mut subs: Vec<Subscription> = self
            .read()?
            .subscriptions
            .values()
            .filter(|s| s.active && s.exam_program_id == program)
            .cloned()
            .collect();
        subs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(subs)
    }

    async fn count_by_user(&self, user: UserId) -> AppResult<u64> {
        Ok(self
            .read()?
            .subscriptions
            .values()
            .filter(|s| s.user_id == user)
            .count() as u64)
    }

    async fn create_subscription(&self, input: NewSubscription) -> AppResult<Subscription> {
        input.validate()?;
        let mut tables = self.write()?;
        if tables
            .subscriptions
            .values()
            .any(|s| s.user_id == input.user_id && s.exam_program_id == input.exam_program_id)
        {
            return Err(AppError::conflict("User already follows this exam program"));
        }
        let now = Utc::now();
        let subscription = Subscription {
            id: SubscriptionId::new(),
            user_id: input.user_id,
            exam_program_id: input.exam_program_id,
            channels: input.channels,
            category_filter: input.category_filter,
            active: true,
            created_at: now,
            updated_at: now,
        };
        tables
            .subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(subscription)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_profile(&self, id: UserId) -> AppResult<Option<Profile>> {
        self.profile(id)
    }

    async fn find_profiles(&self, ids: &[UserId]) -> AppResult<Vec<Profile>> {
        let tables = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.profiles.get(id).cloned())
            .collect())
    }

    async fn downgrade_expired(&self, now: DateTime<Utc>, tier: &PlanTier) -> AppResult<u64> {
        let mut tables = self.write()?;
        let mut changed = 0;
        for profile in tables.profiles.values_mut() {
            if profile.plan_expired(now) {
                profile.plan_tier = tier.clone();
                profile.plan_expires_at = None;
                profile.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl AttemptStore for MemoryStore {
    async fn append(&self, attempt: NewAttempt) -> AppResult<AppendOutcome> {
        self.put_attempt(attempt.into_attempt(Utc::now()))
    }

    async fn has_sent(
        &self,
        subscription: SubscriptionId,
        event: ExamEventId,
        channel: Channel,
    ) -> AppResult<bool> {
        Ok(self.read()?.attempts.iter().any(|a| {
            a.outcome == AttemptOutcome::Sent
                && a.subscription_id == subscription
                && a.event_id == event
                && a.channel == channel
        }))
    }

    async fn count_sent(
        &self,
        subscription: SubscriptionId,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<u64> {
        Ok(self
            .read()?
            .attempts
            .iter()
            .filter(|a| a.outcome == AttemptOutcome::Sent && a.subscription_id == subscription)
            .filter(|a| since.is_none_or(|s| a.attempted_at >= s))
            .count() as u64)
    }
}
