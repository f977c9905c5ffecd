//! Alert Matcher: which (subscription, channel) pairs should hear about one event.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use vestibulare_core::config::QuotaCycle;
use vestibulare_core::result::AppResult;
use vestibulare_core::types::{SubscriptionId, UserId};
use vestibulare_database::Stores;
use vestibulare_entity::event::ExamEvent;
use vestibulare_entity::profile::Profile;
use vestibulare_entity::program::ExamProgram;
use vestibulare_entity::subscription::{Channel, Subscription};

use crate::entitlement::{Decision, DenyReason, EntitlementGuard, cycle_start};
use crate::ledger::{DedupLedger, TripleKey};
use crate::notifier::template::{format_long_date, urgency_text};
use crate::notifier::{Recipient, TemplateContext};

/// Whether the days-before offset gate applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetGate {
    /// Only fire on configured offset days (periodic sweep).
    Scheduled,
    /// Ignore offsets (operator broadcast).
    Bypass,
}

/// Why a (subscription, channel) pair was not selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// A `sent` record already exists for the triple.
    AlreadySent,
    /// The entitlement guard said no.
    Entitlement(DenyReason),
    /// The subscribing user's profile no longer exists.
    MissingUser,
    /// The event's exam program no longer exists.
    MissingProgram,
    /// The profile lacks a usable address for the channel.
    RecipientUnverified,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySent => f.write_str("already-sent"),
            Self::Entitlement(reason) => write!(f, "entitlement:{reason}"),
            Self::MissingUser => f.write_str("missing-user"),
            Self::MissingProgram => f.write_str("missing-program"),
            Self::RecipientUnverified => f.write_str("recipient-unverified"),
        }
    }
}

impl Serialize for SkipReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One pair selected for dispatch, with everything the notifier needs.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Subscription being served.
    pub subscription_id: SubscriptionId,
    /// Channel to deliver over.
    pub channel: Channel,
    /// Who receives it.
    pub recipient: Recipient,
    /// Fully populated message context.
    pub context: TemplateContext,
    /// Event the reminder is about.
    pub event: Arc<ExamEvent>,
    /// Quota the pair was admitted under, re-checked at send time.
    pub quota: QuotaWindow,
}

/// Per-subscription quota in force when a candidate was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaWindow {
    /// Successful sends allowed in the cycle.
    pub limit: u32,
    /// Start of the cycle; `None` for a lifetime quota.
    pub since: Option<DateTime<Utc>>,
}

impl QuotaWindow {
    /// Whether `used` successful sends leave room for one more.
    pub fn has_room_after(&self, used: u64) -> bool {
        used < u64::from(self.limit)
    }
}

impl Candidate {
    /// Dedup triple of this candidate.
    pub fn key(&self) -> TripleKey {
        TripleKey {
            subscription: self.subscription_id,
            event: self.event.id,
            channel: self.channel,
        }
    }
}

/// One pair that was not selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Subscription concerned.
    pub subscription_id: SubscriptionId,
    /// Channel concerned.
    pub channel: Channel,
    /// Why.
    pub reason: SkipReason,
}

/// Result of matching one event.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Pairs to dispatch.
    pub candidates: Vec<Candidate>,
    /// Pairs filtered out.
    pub skipped: Vec<Skipped>,
}

impl MatchOutcome {
    fn skip(&mut self, subscription_id: SubscriptionId, channel: Channel, reason: SkipReason) {
        self.skipped.push(Skipped {
            subscription_id,
            channel,
            reason,
        });
    }
}

/// Per-run instant and local date.
#[derive(Debug, Clone, Copy)]
pub struct MatchTime {
    /// Current instant.
    pub now: DateTime<Utc>,
    /// Local calendar date of `now`.
    pub today: NaiveDate,
}

/// Computes candidate sets for events.
#[derive(Debug, Clone)]
pub struct AlertMatcher {
    stores: Stores,
    ledger: Arc<DedupLedger>,
    guard: EntitlementGuard,
    default_offsets: Vec<u32>,
    quota_cycle: QuotaCycle,
    offset: FixedOffset,
}

impl AlertMatcher {
    /// Create a matcher.
    pub fn new(
        stores: Stores,
        ledger: Arc<DedupLedger>,
        guard: EntitlementGuard,
        default_offsets: Vec<u32>,
        quota_cycle: QuotaCycle,
        offset: FixedOffset,
    ) -> Self {
        Self {
            stores,
            ledger,
            guard,
            default_offsets,
            quota_cycle,
            offset,
        }
    }

    /// Whether the scheduled sweep should consider `event` on `today`.
    pub fn is_due(&self, event: &ExamEvent, today: NaiveDate) -> bool {
        event.is_due_on(today, &self.default_offsets)
    }

    /// Compute candidates for `event`.
    ///
    /// An event off its offset days (under [`OffsetGate::Scheduled`]) or
    /// with no active subscribers yields an empty outcome. Errors only come
    /// from the stores.
    pub async fn match_event(
        &self,
        event: Arc<ExamEvent>,
        time: MatchTime,
        gate: OffsetGate,
    ) -> AppResult<MatchOutcome> {
        let mut outcome = MatchOutcome::default();
        if gate == OffsetGate::Scheduled && !self.is_due(&event, time.today) {
            return Ok(outcome);
        }

        let subscriptions = self
            .stores
            .subscriptions
            .find_active_by_program(event.exam_program_id)
            .await?;
        if subscriptions.is_empty() {
            debug!(event_id = %event.id, "No active subscriptions");
            return Ok(outcome);
        }

        let Some(program) = self.stores.programs.find_program(event.exam_program_id).await? else {
            for sub in &subscriptions {
                for channel in unique_channels(sub) {
                    outcome.skip(sub.id, channel, SkipReason::MissingProgram);
                }
            }
            return Ok(outcome);
        };

        let user_ids: Vec<UserId> = subscriptions
            .iter()
            .map(|s| s.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let profiles: HashMap<UserId, Profile> = self
            .stores
            .profiles
            .find_profiles(&user_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let since = cycle_start(self.quota_cycle, time.now, self.offset);
        let days_until = event.days_until(time.today);

        for sub in &subscriptions {
            let Some(profile) = profiles.get(&sub.user_id) else {
                for channel in unique_channels(sub) {
                    outcome.skip(sub.id, channel, SkipReason::MissingUser);
                }
                continue;
            };

            let used = self.ledger.sent_in_cycle(sub.id, since).await?;
            let mut reserved = 0u64;
            let quota = QuotaWindow {
                limit: self
                    .guard
                    .plans()
                    .effective_policy(profile, time.now)
                    .max_notifications_per_cycle,
                since,
            };

            for channel in unique_channels(sub) {
                let key = TripleKey {
                    subscription: sub.id,
                    event: event.id,
                    channel,
                };
                if self.ledger.has_succeeded(key).await? {
                    outcome.skip(sub.id, channel, SkipReason::AlreadySent);
                    continue;
                }

                let decision = self.guard.permits(
                    profile,
                    sub,
                    &event,
                    channel,
                    used + reserved,
                    time.now,
                );
                if let Decision::Deny(reason) = decision {
                    debug!(
                        subscription_id = %sub.id,
                        event_id = %event.id,
                        %channel,
                        %reason,
                        "Entitlement denied"
                    );
                    outcome.skip(sub.id, channel, SkipReason::Entitlement(reason));
                    continue;
                }

                if !profile.can_receive(channel) {
                    debug!(subscription_id = %sub.id, %channel, "Recipient not reachable on channel");
                    outcome.skip(sub.id, channel, SkipReason::RecipientUnverified);
                    continue;
                }

                reserved += 1;
                outcome.candidates.push(Candidate {
                    subscription_id: sub.id,
                    channel,
                    recipient: Recipient::from(profile),
                    context: build_context(profile, &program, &event, days_until),
                    event: event.clone(),
                    quota,
                });
            }
        }

        Ok(outcome)
    }
}

fn unique_channels(subscription: &Subscription) -> Vec<Channel> {
    let mut seen = BTreeSet::new();
    subscription
        .channels
        .iter()
        .copied()
        .filter(|c| seen.insert(*c))
        .collect()
}

fn build_context(
    profile: &Profile,
    program: &ExamProgram,
    event: &ExamEvent,
    days_until: i64,
) -> TemplateContext {
    TemplateContext {
        user_name: profile.display_name().to_string(),
        program_name: program.name.clone(),
        event_label: event.label.clone(),
        formatted_date: format_long_date(event.event_date),
        urgency_text: urgency_text(days_until),
        official_url: event
            .official_url
            .clone()
            .or_else(|| program.official_url.clone()),
    }
}
