//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::watch;
use tower::ServiceExt;

use vestibulare_alert::{
    DeliveryError, DispatchEngine, FixedClock, Notifier, NotifierRegistry, PlanTable, Recipient,
    TemplateContext,
};
use vestibulare_api::{AppState, build_router};
use vestibulare_core::config::{DispatchConfig, OperatorConfig, PlansConfig};
use vestibulare_core::types::{ExamEventId, ExamProgramId, SubscriptionId, UserId};
use vestibulare_database::{MemoryStore, Stores};
use vestibulare_entity::attempt::{AttemptOutcome, NewAttempt, NotificationAttempt};
use vestibulare_entity::event::{DateSource, EventCategory, ExamEvent};
use vestibulare_entity::profile::{PlanTier, Profile};
use vestibulare_entity::program::ExamProgram;
use vestibulare_entity::subscription::{Channel, Subscription};

/// Operator token used by [`TestApp`].
pub const OPERATOR_TOKEN: &str = "test-operator-token";

/// 2026-10-17, the fixed "today" of every scenario.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).expect("valid date")
}

/// 12:00 UTC on [`today`], 09:00 in UTC-3.
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0)
        .single()
        .expect("valid instant")
}

#[derive(Debug, Default)]
struct Outbox {
    deliveries: Vec<(Recipient, TemplateContext)>,
    failure: Option<String>,
}

/// Notifier double that keeps every message it accepts.
#[derive(Debug, Clone)]
pub struct RecordingNotifier {
    channel: Channel,
    outbox: Arc<Mutex<Outbox>>,
}

impl RecordingNotifier {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            outbox: Arc::default(),
        }
    }

    /// Reject every send with `message` until [`RecordingNotifier::recover`].
    pub fn fail_with(&self, message: &str) {
        self.outbox.lock().expect("outbox lock").failure = Some(message.to_string());
    }

    pub fn recover(&self) {
        self.outbox.lock().expect("outbox lock").failure = None;
    }

    pub fn deliveries(&self) -> Vec<(Recipient, TemplateContext)> {
        self.outbox.lock().expect("outbox lock").deliveries.clone()
    }

    pub fn count(&self) -> usize {
        self.outbox.lock().expect("outbox lock").deliveries.len()
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
        let mut outbox = self.outbox.lock().expect("outbox lock");
        if let Some(message) = &outbox.failure {
            return Err(DeliveryError::Rejected(message.clone()));
        }
        outbox
            .deliveries
            .push((recipient.clone(), context.clone()));
        Ok(())
    }
}

/// A memory-backed engine with one recording notifier per channel.
pub struct World {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub engine: Arc<DispatchEngine>,
    pub email: RecordingNotifier,
    pub sms: RecordingNotifier,
    pub whatsapp: RecordingNotifier,
}

impl World {
    pub fn new() -> Self {
        Self::with_plans(PlansConfig::default())
    }

    /// Default plans with `tier`'s per-cycle quota overridden.
    pub fn with_quota(tier: &str, max: u32) -> Self {
        let mut plans = PlansConfig::default();
        plans
            .tiers
            .get_mut(tier)
            .expect("tier exists")
            .max_notifications_per_cycle = max;
        Self::with_plans(plans)
    }

    pub fn with_plans(plans: PlansConfig) -> Self {
        Self::build(plans, None)
    }

    /// An engine that has already observed the shutdown signal.
    pub fn shutting_down() -> Self {
        let (_tx, rx) = watch::channel(true);
        Self::build(PlansConfig::default(), Some(rx))
    }

    fn build(plans: PlansConfig, shutdown: Option<watch::Receiver<bool>>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(noon()));
        let email = RecordingNotifier::new(Channel::Email);
        let sms = RecordingNotifier::new(Channel::Sms);
        let whatsapp = RecordingNotifier::new(Channel::Whatsapp);

        let registry = NotifierRegistry::new()
            .with(Arc::new(email.clone()))
            .with(Arc::new(sms.clone()))
            .with(Arc::new(whatsapp.clone()));
        let plans = Arc::new(PlanTable::from_config(&plans).expect("valid plans"));

        let engine = DispatchEngine::new(
            Stores::memory(store.clone()),
            plans,
            Arc::new(registry),
            clock.clone(),
            &DispatchConfig::default(),
        )
        .expect("valid dispatch config");
        let engine = match shutdown {
            Some(rx) => engine.with_shutdown(rx),
            None => engine,
        };

        Self {
            store,
            clock,
            engine: Arc::new(engine),
            email,
            sms,
            whatsapp,
        }
    }

    pub fn program(&self, name: &str) -> ExamProgram {
        let program = ExamProgram {
            id: ExamProgramId::new(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            official_url: Some(format!("https://{}.example.br", name.to_lowercase())),
            active: true,
            created_at: noon(),
            updated_at: noon(),
        };
        self.store.put_program(program.clone()).expect("put program");
        program
    }

    pub fn user(&self, tier: &str, first_name: &str) -> Profile {
        let profile = Profile {
            id: UserId::new(),
            email: format!("{}@example.com", first_name.to_lowercase()),
            full_name: Some(format!("{first_name} Oliveira")),
            phone: Some("+5511988887777".to_string()),
            plan_tier: PlanTier::new(tier),
            plan_expires_at: None,
            is_admin: false,
            email_verified: true,
            phone_verified: true,
            whatsapp_verified: true,
            created_at: noon(),
            updated_at: noon(),
        };
        self.store.put_profile(profile.clone()).expect("put profile");
        profile
    }

    pub fn subscribe(
        &self,
        profile: &Profile,
        program: &ExamProgram,
        channels: &[Channel],
    ) -> Subscription {
        self.subscribe_filtered(profile, program, channels, None)
    }

    pub fn subscribe_filtered(
        &self,
        profile: &Profile,
        program: &ExamProgram,
        channels: &[Channel],
        categories: Option<Vec<EventCategory>>,
    ) -> Subscription {
        let subscription = Subscription {
            id: SubscriptionId::new(),
            user_id: profile.id,
            exam_program_id: program.id,
            channels: channels.to_vec(),
            category_filter: categories,
            active: true,
            created_at: noon(),
            updated_at: noon(),
        };
        self.store
            .put_subscription(subscription.clone())
            .expect("put subscription");
        subscription
    }

    /// An event `days` after [`today`] with the given offsets.
    pub fn event(
        &self,
        program: &ExamProgram,
        category: EventCategory,
        label: &str,
        days: u64,
        offsets: &[i32],
    ) -> ExamEvent {
        let event = ExamEvent {
            id: ExamEventId::new(),
            exam_program_id: program.id,
            category,
            label: label.to_string(),
            event_date: today() + chrono::Days::new(days),
            end_date: None,
            alert_days_before: offsets.to_vec(),
            official_url: None,
            notes: None,
            source: DateSource::Manual,
            created_at: noon(),
            updated_at: noon(),
        };
        self.store.put_event(event.clone()).expect("put event");
        event
    }

    /// Seed a successful attempt, as if an earlier run had delivered it.
    pub fn prior_send(&self, subscription: &Subscription, event: &ExamEvent, channel: Channel) {
        self.store
            .put_attempt(NewAttempt::sent(subscription.id, event.id, channel).into_attempt(noon()))
            .expect("put attempt");
    }

    pub fn attempts(&self) -> Vec<NotificationAttempt> {
        self.store.attempts().expect("read attempts")
    }

    pub fn sent_attempts(&self) -> Vec<NotificationAttempt> {
        self.attempts()
            .into_iter()
            .filter(|a| a.outcome == AttemptOutcome::Sent)
            .collect()
    }

    /// Move the frozen clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        self.clock.advance(chrono::Duration::days(days));
    }
}

/// Router over a [`World`] with the operator token set.
pub struct TestApp {
    pub router: Router,
    pub world: World,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_token(OPERATOR_TOKEN)
    }

    /// An app whose operator token is `token`; empty disables the admin routes.
    pub fn with_token(token: &str) -> Self {
        Self::over(World::new(), token)
    }

    /// An app whose engine is already shutting down.
    pub fn shutting_down() -> Self {
        Self::over(World::shutting_down(), OPERATOR_TOKEN)
    }

    fn over(world: World, token: &str) -> Self {
        let state = AppState::new(
            world.engine.clone(),
            OperatorConfig {
                token: token.to_string(),
            },
            None,
        );
        Self {
            router: build_router(state),
            world,
        }
    }

    pub async fn request(&self, method: &str, path: &str, token: Option<&str>) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req.body(Body::empty()).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
