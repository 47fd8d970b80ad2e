//! ingestq - Priority Ingestion Scheduler daemon
//! Wires the SQLite (or in-memory) status store, the simulated batch API,
//! the dispatch scheduler and the HTTP API, then waits for Ctrl+C.

mod config;
mod logging;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use config::{DaemonConfig, StoreBackend};
use ingestq_api_http::{AppState, HttpServer};
use ingestq_core::application::{shutdown_channel, DispatchScheduler, IngestionService};
use ingestq_core::port::id_provider::UuidProvider;
use ingestq_core::port::status_store::mocks::InMemoryStatusStore;
use ingestq_core::port::time_provider::SystemTimeProvider;
use ingestq_core::port::{StatusStore, TimeProvider};
use ingestq_infra_sqlite::{create_pool, run_migrations, SqliteStatusStore};
use ingestq_infra_system::SimulatedBatchApi;

const SCHEDULER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration and initialize logging
    let config = DaemonConfig::from_env().context("Invalid configuration")?;
    logging::init_logging(config.log_format)?;

    info!("ingestq v{} starting...", ingestq_core::VERSION);

    // 2. Status store
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let store = open_store(&config.store, time_provider).await?;

    // 3. Setup dependencies (DI wiring)
    let mut batch_api = SimulatedBatchApi::new(config.batch_delay);
    if let Some(limit) = config.batch_timeout {
        batch_api = batch_api.with_timeout(limit);
    }
    let scheduler = Arc::new(DispatchScheduler::new(
        store.clone(),
        Arc::new(batch_api),
        config.scheduler.clone(),
    ));
    let service = Arc::new(IngestionService::new(
        store,
        scheduler.clone(),
        Arc::new(UuidProvider),
    ));

    // 4. Report records a previous run left unfinished (they are not requeued)
    match service.stats().await {
        Ok(stats) => {
            info!(
                total_ingestions = stats.total_ingestions,
                completed = stats.completed,
                unfinished = stats.unfinished(),
                "Status store loaded"
            );
            if stats.unfinished() > 0 {
                warn!(
                    unfinished = stats.unfinished(),
                    "Ingestions from a previous run will not be resumed"
                );
            }
        }
        Err(e) => warn!(error = %e, "Could not read status store stats"),
    }

    // 5. Start the dispatch scheduler
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    info!(
        min_dispatch_interval_ms = config.scheduler.min_dispatch_interval.as_millis() as u64,
        batch_delay_ms = config.batch_delay.as_millis() as u64,
        "Starting dispatch scheduler..."
    );
    let scheduler_token = shutdown_rx.clone();
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.run(scheduler_token).await {
            tracing::error!(error = ?e, "Scheduler failed");
        }
    });

    // 6. Start the HTTP server
    let server = HttpServer::bind(&config.http, AppState::new(service))
        .await
        .with_context(|| format!("Failed to bind HTTP server on {}", config.http.addr()))?;
    let server_handle = tokio::spawn(server.run(shutdown_rx));

    info!("System ready. Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    match server_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "HTTP server stopped with error"),
        Err(e) => warn!(error = %e, "HTTP server task failed"),
    }
    if tokio::time::timeout(SCHEDULER_STOP_TIMEOUT, scheduler_handle)
        .await
        .is_err()
    {
        warn!("Scheduler did not stop in time");
    }

    info!("Shutdown complete.");
    Ok(())
}

async fn open_store(
    backend: &StoreBackend,
    time_provider: Arc<dyn TimeProvider>,
) -> Result<Arc<dyn StatusStore>> {
    match backend {
        StoreBackend::Memory => {
            warn!("Using in-memory status store; records are lost on exit");
            Ok(Arc::new(InMemoryStatusStore::new()))
        }
        StoreBackend::Sqlite { db_path } => {
            info!(db_path = %db_path, "Initializing database...");
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
            }

            let pool = create_pool(db_path)
                .await
                .context("DB pool creation failed")?;
            run_migrations(&pool).await.context("Migration failed")?;

            Ok(Arc::new(SqliteStatusStore::new(pool, time_provider)))
        }
    }
}
