//! Shared fixtures for unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use vestibulare_core::config::{DispatchConfig, PlansConfig};
use vestibulare_core::types::{ExamEventId, ExamProgramId, SubscriptionId, UserId};
use vestibulare_database::{MemoryStore, Stores};
use vestibulare_entity::event::{DateSource, EventCategory, ExamEvent};
use vestibulare_entity::profile::{PlanTier, Profile};
use vestibulare_entity::program::ExamProgram;
use vestibulare_entity::subscription::{Channel, Subscription};

use crate::clock::{FixedClock, local_date, zone_offset};
use crate::dispatch::DispatchEngine;
use crate::entitlement::EntitlementGuard;
use crate::ledger::DedupLedger;
use crate::matcher::{AlertMatcher, MatchTime};
use crate::notifier::{DeliveryError, Notifier, NotifierRegistry, Recipient, TemplateContext};
use crate::plan::PlanTable;

/// 2026-10-17, the fixed "today" of every fixture.
pub const TODAY: (i32, u32, u32) = (2026, 10, 17);

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(TODAY.0, TODAY.1, TODAY.2).unwrap()
}

/// Noon UTC on [`TODAY`], mid-morning in UTC-3.
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(TODAY.0, TODAY.1, TODAY.2, 12, 0, 0)
        .unwrap()
}

pub fn default_plans() -> Arc<PlanTable> {
    Arc::new(PlanTable::from_config(&PlansConfig::default()).unwrap())
}

pub fn profile_on(tier: &str) -> Profile {
    Profile {
        id: UserId::new(),
        email: "ana@example.com".to_string(),
        full_name: Some("Ana Souza".to_string()),
        phone: Some("+5511999990000".to_string()),
        plan_tier: PlanTier::new(tier),
        plan_expires_at: None,
        is_admin: false,
        email_verified: true,
        phone_verified: true,
        whatsapp_verified: true,
        created_at: noon(),
        updated_at: noon(),
    }
}

pub fn subscription_for(profile: &Profile, channels: &[Channel]) -> Subscription {
    Subscription {
        id: SubscriptionId::new(),
        user_id: profile.id,
        exam_program_id: ExamProgramId::new(),
        channels: channels.to_vec(),
        category_filter: None,
        active: true,
        created_at: noon(),
        updated_at: noon(),
    }
}

pub fn event_in(category: EventCategory, days: u64) -> ExamEvent {
    event_for(ExamProgramId::new(), category, days, vec![])
}

fn event_for(
    program: ExamProgramId,
    category: EventCategory,
    days: u64,
    offsets: Vec<i32>,
) -> ExamEvent {
    ExamEvent {
        id: ExamEventId::new(),
        exam_program_id: program,
        category,
        label: "Prova".to_string(),
        event_date: today() + chrono::Days::new(days),
        end_date: None,
        alert_days_before: offsets,
        official_url: None,
        notes: None,
        source: DateSource::Manual,
        created_at: noon(),
        updated_at: noon(),
    }
}

/// A memory store seeded with one exam program and a frozen clock.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub plans: Arc<PlanTable>,
    pub program: ExamProgram,
    pub clock: Arc<FixedClock>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_plans(PlansConfig::default())
    }

    /// Default plans with `tier`'s quota overridden.
    pub fn with_quota(tier: &str, max: u32) -> Self {
        let mut plans = PlansConfig::default();
        if let Some(row) = plans.tiers.get_mut(tier) {
            row.max_notifications_per_cycle = max;
        }
        Self::with_plans(plans)
    }

    pub fn with_plans(plans: PlansConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let program = ExamProgram {
            id: ExamProgramId::new(),
            name: "ENEM".to_string(),
            slug: "enem".to_string(),
            official_url: Some("https://enem.inep.gov.br".to_string()),
            active: true,
            created_at: noon(),
            updated_at: noon(),
        };
        store.put_program(program.clone()).unwrap();
        Self {
            store,
            plans: Arc::new(PlanTable::from_config(&plans).unwrap()),
            program,
            clock: Arc::new(FixedClock::new(noon())),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        use crate::clock::Clock;
        self.clock.now()
    }

    pub fn time(&self) -> MatchTime {
        let now = self.now();
        MatchTime {
            now,
            today: local_date(now, zone_offset(-3).unwrap()),
        }
    }

    pub fn stores(&self) -> Stores {
        Stores::memory(self.store.clone())
    }

    pub fn user(&self, tier: &str) -> Profile {
        let profile = profile_on(tier);
        self.store.put_profile(profile.clone()).unwrap();
        profile
    }

    pub fn subscribe(&self, profile: &Profile, channels: &[Channel]) -> Subscription {
        let mut sub = subscription_for(profile, channels);
        sub.exam_program_id = self.program.id;
        self.store.put_subscription(sub.clone()).unwrap();
        sub
    }

    /// A subscription whose user has no profile.
    pub fn subscribe_orphan(&self, channels: &[Channel]) -> Subscription {
        let ghost = profile_on("basic");
        self.subscribe(&ghost, channels)
    }

    pub fn event(&self, category: EventCategory, days: u64, offsets: Vec<i32>) -> Arc<ExamEvent> {
        let event = event_for(self.program.id, category, days, offsets);
        self.store.put_event(event.clone()).unwrap();
        Arc::new(event)
    }

    pub fn matcher(&self) -> AlertMatcher {
        let dispatch = DispatchConfig::default();
        AlertMatcher::new(
            self.stores(),
            Arc::new(DedupLedger::new(self.store.clone())),
            EntitlementGuard::new(self.plans.clone()),
            dispatch.default_offsets,
            dispatch.quota_cycle,
            zone_offset(dispatch.utc_offset_hours).unwrap(),
        )
    }

    pub fn engine(&self, notifiers: Vec<RecordingNotifier>) -> DispatchEngine {
        let registry = notifiers
            .into_iter()
            .fold(NotifierRegistry::new(), |registry, n| {
                registry.with(Arc::new(n))
            });
        DispatchEngine::new(
            self.stores(),
            self.plans.clone(),
            Arc::new(registry),
            self.clock.clone(),
            &DispatchConfig::default(),
        )
        .unwrap()
    }
}

#[derive(Debug, Default)]
struct RecorderState {
    deliveries: Vec<(Recipient, TemplateContext)>,
    failure: Option<String>,
}

/// Notifier double that remembers what it was asked to send.
#[derive(Debug, Clone)]
pub struct RecordingNotifier {
    channel: Channel,
    delay: Option<Duration>,
    state: Arc<Mutex<RecorderState>>,
}

impl RecordingNotifier {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            delay: None,
            state: Arc::default(),
        }
    }

    /// Reject every send with `message` until [`RecordingNotifier::recover`].
    pub fn failing(self, message: &str) -> Self {
        self.state.lock().unwrap().failure = Some(message.to_string());
        self
    }

    pub fn recover(&self) {
        self.state.lock().unwrap().failure = None;
    }

    /// Sleep for `delay` before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn deliveries(&self) -> Vec<(Recipient, TemplateContext)> {
        self.state.lock().unwrap().deliveries.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(
        &self,
        recipient: &Recipient,
        context: &TemplateContext,
    ) -> Result<(), DeliveryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.failure {
            return Err(DeliveryError::Rejected(message.clone()));
        }
        state.deliveries.push((recipient.clone(), context.clone()));
        Ok(())
    }
}
