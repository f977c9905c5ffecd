//! Job executor: runs registered handlers by name.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use vestibulare_core::error::{AppError, ErrorKind};

/// A unit of scheduled work.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// Name the job is registered and scheduled under.
    fn name(&self) -> &str;

    /// Run the job once, returning a JSON summary.
    async fn run(&self) -> Result<Value, JobExecutionError>;
}

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Will fail again until someone intervenes.
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// May succeed on the next scheduled run.
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(AppError),
}

impl From<AppError> for JobExecutionError {
    fn from(err: AppError) -> Self {
        match err.kind {
            ErrorKind::Database | ErrorKind::ServiceUnavailable => {
                Self::Transient(err.to_string())
            }
            ErrorKind::Configuration | ErrorKind::Validation => Self::Permanent(err.to_string()),
            _ => Self::Internal(err),
        }
    }
}

/// Name → handler registry.
#[derive(Debug, Default)]
pub struct JobExecutor {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create an empty executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own name.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let name = handler.name().to_string();
        tracing::info!("Registered job handler '{}'", name);
        self.handlers.insert(name, handler);
    }

    /// Run the job registered as `name`.
    pub async fn execute(&self, name: &str) -> Result<Value, JobExecutionError> {
        let handler = self.handlers.get(name).ok_or_else(|| {
            JobExecutionError::Permanent(format!("No handler registered for job '{name}'"))
        })?;

        let started = Instant::now();
        tracing::info!("Running job '{}'", name);
        let result = handler.run().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(summary) => tracing::info!(job = name, elapsed_ms, %summary, "Job completed"),
            Err(JobExecutionError::Transient(e)) => {
                tracing::warn!(job = name, elapsed_ms, error = %e, "Job failed; will retry on next schedule")
            }
            Err(e) => tracing::error!(job = name, elapsed_ms, error = %e, "Job failed"),
        }
        result
    }

    /// Whether a handler is registered as `name`.
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered job names, sorted.
    pub fn registered(&self) -> Vec<String> {
        let mut names: Vec<_> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}
