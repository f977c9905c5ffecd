//! Cron scheduler for the periodic jobs.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use vestibulare_core::config::WorkerConfig;
use vestibulare_core::error::AppError;

use crate::executor::JobExecutor;
use crate::jobs::{AlertSweepJob, PlanExpirationJob};

/// Triggers executor jobs on cron schedules (evaluated in UTC).
pub struct CronScheduler {
    scheduler: JobScheduler,
    executor: Arc<JobExecutor>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("jobs", &self.executor.registered())
            .finish()
    }
}

impl CronScheduler {
    /// Create a scheduler driving `executor`.
    pub async fn new(executor: Arc<JobExecutor>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            executor,
        })
    }

    /// Register the sweep and expiry jobs on their configured schedules.
    pub async fn register_default_tasks(&self, config: &WorkerConfig) -> Result<(), AppError> {
        self.register(AlertSweepJob::NAME, &config.sweep_cron).await?;
        self.register(PlanExpirationJob::NAME, &config.expiration_cron)
            .await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Run the executor job `name` whenever `cron` fires.
    pub async fn register(&self, name: &str, cron: &str) -> Result<(), AppError> {
        if !self.executor.has_handler(name) {
            return Err(AppError::configuration(format!(
                "Cannot schedule '{name}': no handler registered"
            )));
        }

        let executor = Arc::clone(&self.executor);
        let job_name = name.to_string();
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            let job_name = job_name.clone();
            Box::pin(async move {
                // Failures are logged by the executor; the next tick retries.
                let _ = executor.execute(&job_name).await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid schedule '{cron}' for {name}: {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add {name} schedule: {e}")))?;

        tracing::info!("Registered: {} ({})", name, cron);
        Ok(())
    }

    /// Start firing jobs.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Stop firing jobs.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
