//! VestibulaRe server: exam-date reminder dispatch.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use vestibulare_alert::{DispatchEngine, NotifierRegistry, PlanTable, SystemClock};
use vestibulare_core::config::AppConfig;
use vestibulare_core::error::AppError;
use vestibulare_database::{DatabasePool, Stores};
use vestibulare_worker::jobs::{AlertSweepJob, PlanExpirationJob};
use vestibulare_worker::{CronScheduler, JobExecutor};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("VESTIBULARE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting VestibulaRe v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;
    if config.database.run_migrations {
        tracing::info!("Running database migrations...");
        vestibulare_database::migration::run_migrations(db.pool()).await?;
        tracing::info!("Database migrations complete");
    }
    let stores = Stores::postgres(db.pool().clone());

    // ── Step 2: Plan table + notifiers ───────────────────────────
    let plans = Arc::new(PlanTable::from_config(&config.plans)?);
    tracing::info!(
        tiers = plans.tiers().count(),
        restricted = %plans.restricted_tier(),
        "Plan table loaded"
    );

    let notifiers = Arc::new(NotifierRegistry::from_config(&config.notifier)?);
    tracing::info!(
        mode = ?config.notifier.mode,
        channels = ?notifiers.channels(),
        "Notifiers configured"
    );

    // ── Step 3: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 4: Dispatch engine ──────────────────────────────────
    let clock = Arc::new(SystemClock);
    let engine = Arc::new(
        DispatchEngine::new(
            stores.clone(),
            plans.clone(),
            notifiers,
            clock.clone(),
            &config.dispatch,
        )?
        .with_shutdown(shutdown_rx),
    );

    // ── Step 5: Background worker ────────────────────────────────
    let mut scheduler = if config.worker.enabled {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(AlertSweepJob::new(engine.clone())));
        executor.register(Arc::new(PlanExpirationJob::new(
            stores.profiles.clone(),
            plans.clone(),
            clock,
        )));

        let scheduler = CronScheduler::new(Arc::new(executor)).await?;
        scheduler.register_default_tasks(&config.worker).await?;
        scheduler.start().await?;
        tracing::info!(
            sweep_cron = %config.worker.sweep_cron,
            expiration_cron = %config.worker.expiration_cron,
            "Background worker started"
        );
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── Step 6: Build and start HTTP server ──────────────────────
    if !config.operator.is_enabled() {
        tracing::warn!("No operator token configured; admin endpoints will refuse every request");
    }
    let state = vestibulare_api::AppState::new(engine, config.operator.clone(), Some(db.clone()));
    let app = vestibulare_api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("VestibulaRe server listening on {}", addr);

    // ── Step 7: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 8: Stop background tasks ────────────────────────────
    if let Some(scheduler) = scheduler.as_mut() {
        tracing::info!("Stopping background worker...");
        let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
        match tokio::time::timeout(grace, scheduler.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Worker shutdown failed"),
            Err(_) => tracing::warn!("Worker did not stop within the grace period"),
        }
    }

    db.close().await;
    tracing::info!("VestibulaRe server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
