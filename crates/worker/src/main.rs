//! Fan-out worker: periodically runs the message pipeline.
//!
//! Connects to the database, loads the inbox configuration from the
//! environment, builds the configured delivery backends, and runs
//! [`Processor::process_new_messages`] on a fixed interval until the
//! process receives Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use inbox_core::config;
use inbox_events::delivery::app_push::create_app_push_backend;
use inbox_events::delivery::email::{
    EmailBackend, EmailConfig, LocmemEmailBackend, SmtpEmailBackend,
};
use inbox_events::EventBus;
use inbox_pipeline::Processor;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default seconds between pipeline runs.
const DEFAULT_PROCESS_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inbox_worker=info,inbox_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = inbox_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    inbox_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    inbox_db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    config::install(config::load_from_env().context("Invalid inbox configuration")?);

    let resolved = config::get();
    let push = create_app_push_backend(&resolved.backends.app_push)
        .context("Failed to build app push backend")?;
    let email: Arc<dyn EmailBackend> = match EmailConfig::from_env() {
        Some(smtp) => Arc::new(SmtpEmailBackend::new(smtp)),
        None => {
            tracing::warn!("SMTP_HOST not set; emails go to the in-memory outbox");
            Arc::new(LocmemEmailBackend::default())
        }
    };

    let bus = Arc::new(EventBus::default());
    let processor = Processor::new(pool, push, email, bus);

    let interval_secs = std::env::var("PROCESS_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PROCESS_INTERVAL_SECS);

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    tracing::info!(interval_secs, "Worker starting");
    run_loop(&processor, interval_secs, cancel).await;
    tracing::info!("Worker stopped");
    Ok(())
}

/// Run the pipeline on a fixed interval until cancelled.
///
/// Configuration is re-read from the process cache every tick, so an
/// `install` or `reset` takes effect on the next run without a restart.
async fn run_loop(processor: &Processor, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Worker loop cancelled");
                break;
            }
            _ = interval.tick() => {
                let resolved = config::get();
                if let Err(e) = processor.process_new_messages(&resolved).await {
                    tracing::error!(error = %e, "Pipeline run failed");
                }
            }
        }
    }
}
