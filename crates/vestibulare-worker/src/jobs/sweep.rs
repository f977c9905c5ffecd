//! Daily alert sweep.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use vestibulare_alert::DispatchEngine;
use vestibulare_core::AppError;

use crate::executor::{JobExecutionError, JobHandler};

/// Runs [`DispatchEngine::run_sweep`] over the configured window.
#[derive(Debug)]
pub struct AlertSweepJob {
    engine: Arc<DispatchEngine>,
}

impl AlertSweepJob {
    /// Job name used for scheduling.
    pub const NAME: &'static str = "alert_sweep";

    /// Create the job.
    pub fn new(engine: Arc<DispatchEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl JobHandler for AlertSweepJob {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self) -> Result<Value, JobExecutionError> {
        let report = self.engine.run_sweep(None).await?;
        let summary = serde_json::to_value(&report).map_err(AppError::from)?;
        Ok(summary)
    }
}
