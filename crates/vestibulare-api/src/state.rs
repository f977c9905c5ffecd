//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use vestibulare_alert::DispatchEngine;
use vestibulare_core::config::OperatorConfig;
use vestibulare_database::DatabasePool;

/// State handed to every handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Sweep and broadcast engine.
    pub engine: Arc<DispatchEngine>,
    /// Operator credentials.
    pub operator: Arc<OperatorConfig>,
    /// Pool pinged by the health check; `None` when running on the memory store.
    pub db: Option<DatabasePool>,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Build the state.
    pub fn new(
        engine: Arc<DispatchEngine>,
        operator: OperatorConfig,
        db: Option<DatabasePool>,
    ) -> Self {
        Self {
            engine,
            operator: Arc::new(operator),
            db,
            started_at: Instant::now(),
        }
    }
}
