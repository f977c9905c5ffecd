//! Dedup Ledger: the append-only record of delivery attempts.
//!
//! A `sent` row for a (subscription, event, channel) triple is the dedup
//! key; `failed` rows are kept for visibility and never block a retry. The
//! storage layer rejects a second `sent` row for a triple. Inside this
//! process the per-subscription lock below serialises
//! re-check → send → record for every triple of one subscription, which
//! also keeps the quota count exact across overlapping runs.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use vestibulare_core::result::AppResult;
use vestibulare_core::types::{ExamEventId, SubscriptionId};
use vestibulare_database::store::{AppendOutcome, AttemptStore};
use vestibulare_entity::attempt::NewAttempt;
use vestibulare_entity::subscription::Channel;

/// (subscription, event, channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TripleKey {
    /// Subscription.
    pub subscription: SubscriptionId,
    /// Event.
    pub event: ExamEventId,
    /// Channel.
    pub channel: Channel,
}

impl fmt::Display for TripleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.subscription, self.event, self.channel)
    }
}

/// Held while one of a subscription's triples is being dispatched.
#[derive(Debug)]
pub struct SubscriptionLock {
    _guard: OwnedMutexGuard<()>,
}

/// Ledger facade over an [`AttemptStore`].
pub struct DedupLedger {
    attempts: Arc<dyn AttemptStore>,
    locks: DashMap<SubscriptionId, Arc<Mutex<()>>>,
}

impl DedupLedger {
    /// Create a ledger over `attempts`.
    pub fn new(attempts: Arc<dyn AttemptStore>) -> Self {
        Self {
            attempts,
            locks: DashMap::new(),
        }
    }

    /// Whether the triple was already delivered.
    pub async fn has_succeeded(&self, key: TripleKey) -> AppResult<bool> {
        self.attempts
            .has_sent(key.subscription, key.event, key.channel)
            .await
    }

    /// Append an attempt. Never skipped, whatever the outcome.
    pub async fn record(&self, attempt: NewAttempt) -> AppResult<AppendOutcome> {
        let key = TripleKey {
            subscription: attempt.subscription_id,
            event: attempt.event_id,
            channel: attempt.channel,
        };
        let outcome = attempt.outcome;
        let appended = self.attempts.append(attempt).await?;
        match appended {
            AppendOutcome::Inserted => debug!(triple = %key, %outcome, "Attempt recorded"),
            AppendOutcome::DuplicateSent => warn!(
                triple = %key,
                "Ledger already held a sent record for this triple; duplicate rejected"
            ),
        }
        Ok(appended)
    }

    /// Successful notifications for a subscription since `since` (all time when `None`).
    pub async fn sent_in_cycle(
        &self,
        subscription: SubscriptionId,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<u64> {
        self.attempts.count_sent(subscription, since).await
    }

    /// Wait for exclusive use of a subscription's ledger entries.
    pub async fn lock(&self, subscription: SubscriptionId) -> SubscriptionLock {
        let mutex = self.locks.entry(subscription).or_default().clone();
        SubscriptionLock {
            _guard: mutex.lock_owned().await,
        }
    }

    /// Drop lock entries nobody holds or waits on.
    pub fn prune_locks(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    /// Number of lock entries currently tracked.
    pub fn tracked_locks(&self) -> usize {
        self.locks.len()
    }
}

impl fmt::Debug for DedupLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedupLedger")
            .field("tracked_locks", &self.locks.len())
            .finish_non_exhaustive()
    }
}
