//! Standalone worker binary: runs the reconciliation loop and the
//! notification dispatcher against the configured database.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use brigade_core::models::PlanSpec;
use brigade_core::{LogNotificationSender, WorkerConfig};
use brigade_db::{
    AuditLogRepository, MemberRepository, NotificationRepository, PlanRepository,
    SubscriptionRepository, TrialRepository,
};
use brigade_worker::{
    DispatcherConfig, NotificationDispatcher, Reconciler, ReconcilerConfig, ReconcilerMetrics,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;
    tracing::info!(environment = %config.environment, "Worker starting");

    let pool = setup_database(&config).await?;
    seed_plan_catalog(&pool).await?;

    let metrics = Arc::new(ReconcilerMetrics::new());
    let reconciler = Arc::new(Reconciler::new(
        pool.clone(),
        TrialRepository::new(pool.clone()),
        SubscriptionRepository::new(pool.clone()),
        MemberRepository::new(pool.clone()),
        NotificationRepository::new(pool.clone()),
        AuditLogRepository::new(),
        ReconcilerConfig {
            interval_secs: config.reconcile_interval_secs,
            remind_window_days: config.billing_remind_days,
        },
        Arc::clone(&metrics),
    ));
    let reconciler_handle = reconciler.start();

    let dispatcher = Arc::new(NotificationDispatcher::new(
        NotificationRepository::new(pool.clone()),
        Arc::new(LogNotificationSender),
        DispatcherConfig {
            poll_interval_secs: config.notify_poll_interval_secs,
            batch_size: config.notify_batch_size,
            max_attempts: config.notify_max_attempts,
        },
    ));
    let dispatcher_handle = dispatcher.start();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    reconciler_handle.shutdown().await;
    dispatcher_handle.shutdown().await;

    let snapshot = metrics.snapshot();
    tracing::info!(
        cycles = snapshot.cycles,
        reminders = snapshot.reminders_enqueued,
        trials_expired = snapshot.trials_expired,
        subscriptions_expired = snapshot.subscriptions_expired,
        "Worker stopped"
    );
    Ok(())
}

fn init_tracing() {
    let console_fmt = tracing_subscriber::fmt::layer().compact();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "brigade=info".into()))
        .with(console_fmt)
        .init();
}

/// Connect the pool and run pending migrations.
async fn setup_database(config: &WorkerConfig) -> Result<PgPool> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let migrations_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

/// Idempotent upsert of the default plan catalog.
async fn seed_plan_catalog(pool: &PgPool) -> Result<()> {
    let plans = PlanRepository::new(pool.clone());
    for spec in PlanSpec::catalog_defaults() {
        plans
            .upsert(&spec)
            .await
            .with_context(|| format!("Failed to seed plan '{}'", spec.code))?;
    }
    Ok(())
}
