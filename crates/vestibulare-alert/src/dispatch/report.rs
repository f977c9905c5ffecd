//! Aggregate result of a sweep or broadcast.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::matcher::SkipReason;

/// Counts and diagnostics returned to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Events examined.
    pub events: usize,
    /// Deliveries the notifier accepted.
    pub sent: u64,
    /// Deliveries that failed or timed out.
    pub failed: u64,
    /// Pairs filtered out before delivery.
    pub skipped: u64,
    /// `skipped` broken down by reason.
    pub skip_reasons: BTreeMap<String, u64>,
    /// `<channel>/<recipient>: <message>` diagnostics, oldest first.
    pub errors: Vec<String>,
    /// Diagnostics dropped once `errors` was full.
    pub errors_omitted: u64,
    /// Whether a shutdown signal cut the run short.
    pub aborted: bool,
    #[serde(skip)]
    max_errors: usize,
}

impl DispatchReport {
    /// Empty report keeping at most `max_errors` diagnostics.
    pub fn new(max_errors: usize) -> Self {
        Self {
            events: 0,
            sent: 0,
            failed: 0,
            skipped: 0,
            skip_reasons: BTreeMap::new(),
            errors: Vec::new(),
            errors_omitted: 0,
            aborted: false,
            max_errors,
        }
    }

    pub(crate) fn record_sent(&mut self) {
        self.sent += 1;
    }

    pub(crate) fn record_failed(&mut self, diagnostic: String) {
        self.failed += 1;
        self.push_error(diagnostic);
    }

    pub(crate) fn record_skip(&mut self, reason: SkipReason) {
        self.skipped += 1;
        *self.skip_reasons.entry(reason.to_string()).or_insert(0) += 1;
    }

    pub(crate) fn push_error(&mut self, diagnostic: String) {
        if self.errors.len() < self.max_errors {
            self.errors.push(diagnostic);
        } else {
            self.errors_omitted += 1;
        }
    }
}
