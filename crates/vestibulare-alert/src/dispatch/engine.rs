//! Sweep and broadcast orchestration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Days, FixedOffset};
use futures::{StreamExt, future, stream};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use vestibulare_core::config::DispatchConfig;
use vestibulare_core::error::AppError;
use vestibulare_core::result::AppResult;
use vestibulare_core::types::ExamEventId;
use vestibulare_database::Stores;
use vestibulare_entity::attempt::NewAttempt;
use vestibulare_entity::event::ExamEvent;

use crate::clock::{Clock, local_date, zone_offset};
use crate::entitlement::{DenyReason, EntitlementGuard};
use crate::ledger::DedupLedger;
use crate::matcher::{AlertMatcher, Candidate, MatchTime, OffsetGate, SkipReason};
use crate::notifier::NotifierRegistry;
use crate::plan::PlanTable;

use super::report::DispatchReport;

#[derive(Debug, Clone, Copy)]
struct Settings {
    window_days: u32,
    notifier_timeout: Duration,
    concurrency: usize,
    max_error_entries: usize,
    offset: FixedOffset,
}

/// What happened to one candidate.
#[derive(Debug)]
enum Delivery {
    Sent,
    SentUnrecorded(String),
    Failed(String),
    Skipped(SkipReason),
}

/// Runs sweeps and broadcasts.
///
/// Every dispatched candidate has its outcome recorded in the ledger
/// before the run returns, including when a shutdown signal stops the run
/// early.
#[derive(Debug)]
pub struct DispatchEngine {
    stores: Stores,
    matcher: AlertMatcher,
    ledger: Arc<DedupLedger>,
    notifiers: Arc<NotifierRegistry>,
    clock: Arc<dyn Clock>,
    settings: Settings,
    shutdown: Option<watch::Receiver<bool>>,
}

impl DispatchEngine {
    /// Wire an engine from its collaborators.
    pub fn new(
        stores: Stores,
        plans: Arc<PlanTable>,
        notifiers: Arc<NotifierRegistry>,
        clock: Arc<dyn Clock>,
        config: &DispatchConfig,
    ) -> AppResult<Self> {
        if config.concurrency == 0 {
            return Err(AppError::configuration(
                "dispatch.concurrency must be at least 1",
            ));
        }
        if config.notifier_timeout_seconds == 0 {
            return Err(AppError::configuration(
                "dispatch.notifier_timeout_seconds must be at least 1",
            ));
        }
        if config.default_offsets.is_empty() {
            return Err(AppError::configuration(
                "dispatch.default_offsets must not be empty",
            ));
        }
        let offset = zone_offset(config.utc_offset_hours)?;

        let ledger = Arc::new(DedupLedger::new(stores.attempts.clone()));
        let matcher = AlertMatcher::new(
            stores.clone(),
            ledger.clone(),
            EntitlementGuard::new(plans),
            config.default_offsets.clone(),
            config.quota_cycle,
            offset,
        );

        Ok(Self {
            stores,
            matcher,
            ledger,
            notifiers,
            clock,
            settings: Settings {
                window_days: config.window_days,
                notifier_timeout: Duration::from_secs(config.notifier_timeout_seconds),
                concurrency: config.concurrency,
                max_error_entries: config.max_error_entries,
                offset,
            },
            shutdown: None,
        })
    }

    /// Stop between candidates once `shutdown` turns `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// The ledger used by this engine.
    pub fn ledger(&self) -> &Arc<DedupLedger> {
        &self.ledger
    }

    /// Sweep every event dated within `window_days` (default from config) of today.
    ///
    /// Fails only if the due events cannot be loaded.
    pub async fn run_sweep(&self, window_days: Option<u32>) -> AppResult<DispatchReport> {
        let started = Instant::now();
        let time = self.time();
        let window = window_days.unwrap_or(self.settings.window_days);
        let until = time
            .today
            .checked_add_days(Days::new(u64::from(window)))
            .ok_or_else(|| AppError::validation(format!("Window of {window} days is too large")))?;

        let events = self
            .stores
            .events
            .find_events_between(time.today, until)
            .await
            .map_err(|e| {
                error!(error = %e, from = %time.today, to = %until, "Sweep aborted: could not load due events");
                e
            })?;

        info!(
            today = %time.today,
            window_days = window,
            events = events.len(),
            "Sweep started"
        );

        let mut report = DispatchReport::new(self.settings.max_error_entries);
        for event in events {
            if self.is_stopping() {
                warn!("Sweep stopped by shutdown signal");
                report.aborted = true;
                break;
            }
            self.dispatch_event(Arc::new(event), time, OffsetGate::Scheduled, &mut report)
                .await;
        }
        self.ledger.prune_locks();

        info!(
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            aborted = report.aborted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Sweep finished"
        );
        Ok(report)
    }

    /// Dispatch one event to all of its eligible subscribers, ignoring offsets.
    ///
    /// `NotFound` if the event does not exist.
    pub async fn broadcast(&self, event_id: ExamEventId) -> AppResult<DispatchReport> {
        let event = self
            .stores
            .events
            .find_event(event_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Exam event {event_id} not found")))?;

        let time = self.time();
        info!(event_id = %event.id, label = %event.label, "Broadcast started");

        let mut report = DispatchReport::new(self.settings.max_error_entries);
        self.dispatch_event(Arc::new(event), time, OffsetGate::Bypass, &mut report)
            .await;
        self.ledger.prune_locks();

        info!(
            event_id = %event_id,
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            aborted = report.aborted,
            "Broadcast finished"
        );
        Ok(report)
    }

    fn time(&self) -> MatchTime {
        let now = self.clock.now();
        MatchTime {
            now,
            today: local_date(now, self.settings.offset),
        }
    }

    /// Whether the shutdown signal has been observed.
    pub fn is_stopping(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    async fn dispatch_event(
        &self,
        event: Arc<ExamEvent>,
        time: MatchTime,
        gate: OffsetGate,
        report: &mut DispatchReport,
    ) {
        report.events += 1;
        let matched = match self.matcher.match_event(event.clone(), time, gate).await {
            Ok(matched) => matched,
            Err(e) => {
                error!(event_id = %event.id, error = %e, "Could not match event");
                report.push_error(format!("event/{}: {}", event.id, e.message));
                return;
            }
        };

        for skipped in &matched.skipped {
            report.record_skip(skipped.reason);
        }
        if matched.candidates.is_empty() {
            return;
        }

        let total = matched.candidates.len();
        debug!(event_id = %event.id, candidates = total, "Dispatching candidates");

        let deliveries: Vec<Delivery> = stream::iter(matched.candidates)
            .take_while(|_| future::ready(!self.is_stopping()))
            .map(|candidate| self.deliver(candidate))
            .buffer_unordered(self.settings.concurrency)
            .collect()
            .await;

        if deliveries.len() < total {
            warn!(
                event_id = %event.id,
                dispatched = deliveries.len(),
                total,
                "Dispatch stopped by shutdown signal"
            );
            report.aborted = true;
        }

        for delivery in deliveries {
            match delivery {
                Delivery::Sent => report.record_sent(),
                Delivery::SentUnrecorded(diagnostic) => {
                    report.record_sent();
                    report.push_error(diagnostic);
                }
                Delivery::Failed(diagnostic) => report.record_failed(diagnostic),
                Delivery::Skipped(reason) => report.record_skip(reason),
            }
        }
    }

    /// Re-check, send, record. Holds the subscription lock throughout.
    async fn deliver(&self, candidate: Candidate) -> Delivery {
        let key = candidate.key();
        let channel = candidate.channel;
        let who = candidate.recipient.email.clone();
        let _lock = self.ledger.lock(key.subscription).await;

        match self.recheck(&candidate).await {
            Ok(None) => {}
            Ok(Some(reason)) => {
                debug!(triple = %key, %reason, "Dropped at send time");
                return Delivery::Skipped(reason);
            }
            Err(e) => {
                error!(triple = %key, error = %e, "Ledger check failed; not sending");
                return Delivery::Failed(format!("{channel}/{who}: ledger check failed: {}", e.message));
            }
        }

        let result = match self.notifiers.get(channel) {
            None => Err(format!("no notifier configured for {channel}")),
            Some(notifier) => match tokio::time::timeout(
                self.settings.notifier_timeout,
                notifier.send(&candidate.recipient, &candidate.context),
            )
            .await
            {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!(
                    "timed out after {}s",
                    self.settings.notifier_timeout.as_secs()
                )),
            },
        };

        let attempt = match &result {
            Ok(()) => NewAttempt::sent(key.subscription, key.event, channel),
            Err(message) => NewAttempt::failed(key.subscription, key.event, channel, message.clone()),
        };
        let recorded = self.ledger.record(attempt).await;

        match (result, recorded) {
            (Ok(()), Ok(_)) => {
                debug!(triple = %key, "Reminder sent");
                Delivery::Sent
            }
            (Ok(()), Err(e)) => {
                error!(triple = %key, error = %e, "Reminder sent but not recorded");
                Delivery::SentUnrecorded(format!("{channel}/{who}: sent but not recorded: {}", e.message))
            }
            (Err(message), recorded) => {
                warn!(triple = %key, error = %message, "Reminder failed");
                if let Err(e) = recorded {
                    error!(triple = %key, error = %e, "Failed attempt not recorded");
                }
                Delivery::Failed(format!("{channel}/{who}: {message}"))
            }
        }
    }

    /// Ledger state may have moved since matching: another run can have
    /// sent this triple or used up the subscription's quota.
    async fn recheck(&self, candidate: &Candidate) -> AppResult<Option<SkipReason>> {
        let key = candidate.key();
        if self.ledger.has_succeeded(key).await? {
            return Ok(Some(SkipReason::AlreadySent));
        }
        let used = self
            .ledger
            .sent_in_cycle(key.subscription, candidate.quota.since)
            .await?;
        if !candidate.quota.has_room_after(used) {
            return Ok(Some(SkipReason::Entitlement(DenyReason::QuotaExceeded)));
        }
        Ok(None)
    }
}
