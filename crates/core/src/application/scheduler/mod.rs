//! Dispatch Scheduler - the single consumer of the priority queue
//!
//! One iteration of the loop:
//! - THROTTLED: wait until `min_dispatch_interval` has passed since the previous dispatch ended
//! - IDLE: no job arrives within `idle_poll_interval`, return and retry
//! - DISPATCHING: pop one job and drive its batches to completion, in order
//!
//! The guard (which also owns the last-dispatch instant) is held across the whole
//! throttle-check-and-dispatch sequence, so a job's processing time adds to the floor.

pub mod constants;
mod shutdown;

use constants::*;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::queue::PriorityJobQueue;
use crate::domain::{record_key, Batch, BatchStatus, IngestionId, IngestionJob};
use crate::error::{AppError, Result};
use crate::port::{BatchProcessor, ProcessingError, StatusStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info, warn};

/// Scheduler timing knobs
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub min_dispatch_interval: Duration,
    pub idle_poll_interval: Duration,
    pub error_backoff: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_dispatch_interval: DEFAULT_MIN_DISPATCH_INTERVAL,
            idle_poll_interval: DEFAULT_IDLE_POLL_INTERVAL,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }
}

/// Result of one scheduler iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A job was popped and all its batches completed
    Dispatched(IngestionId),
    /// Nothing to do within the idle poll interval
    Idle,
    /// Shutdown was observed at a suspension point
    Shutdown,
}

/// Owns the queue, the last-dispatch timestamp and the dispatch guard
///
/// Constructed once at startup and shared by `Arc` between producers and the loop.
pub struct DispatchScheduler {
    queue: PriorityJobQueue,
    last_dispatch: Mutex<Option<Instant>>,
    store: Arc<dyn StatusStore>,
    processor: Arc<dyn BatchProcessor>,
    config: SchedulerConfig,
}

impl DispatchScheduler {
    pub fn new(
        store: Arc<dyn StatusStore>,
        processor: Arc<dyn BatchProcessor>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            queue: PriorityJobQueue::new(),
            last_dispatch: Mutex::new(None),
            store,
            processor,
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Enqueue a job whose initial record is already persisted
    pub fn submit(&self, job: IngestionJob) {
        debug!(
            ingestion_id = %job.id,
            priority = %job.priority,
            batches = job.batches().len(),
            "Job queued"
        );
        self.queue.push(job);
    }

    /// Jobs waiting to be dispatched
    pub fn queued_jobs(&self) -> usize {
        self.queue.len()
    }

    /// Run the dispatch loop until shutdown
    ///
    /// Errors from a single job are logged and followed by a backoff; they never end the loop.
    pub async fn run(&self, mut shutdown: ShutdownToken) -> Result<()> {
        info!(
            min_dispatch_interval_ms = self.config.min_dispatch_interval.as_millis() as u64,
            "Dispatch scheduler started"
        );
        loop {
            if shutdown.is_shutdown() {
                break;
            }
            match self.dispatch_next(&mut shutdown).await {
                Ok(DispatchOutcome::Dispatched(_)) | Ok(DispatchOutcome::Idle) => {}
                Ok(DispatchOutcome::Shutdown) => {
                    info!("Dispatch scheduler interrupted");
                    break;
                }
                Err(e) => {
                    if e.is_transient() {
                        warn!(error = %e, "Dispatch failed, backing off");
                    } else {
                        error!(error = %e, "Dispatch failed, backing off");
                    }
                    tokio::select! {
                        _ = sleep(self.config.error_backoff) => {},
                        _ = shutdown.wait() => {
                            info!("Dispatch scheduler interrupted during error backoff");
                            break;
                        }
                    }
                }
            }
        }
        info!("Dispatch scheduler stopped");
        Ok(())
    }

    /// Run one THROTTLED / IDLE / DISPATCHING iteration
    pub async fn dispatch_next(&self, shutdown: &mut ShutdownToken) -> Result<DispatchOutcome> {
        let mut last_dispatch = self.last_dispatch.lock().await;

        if let Some(previous) = *last_dispatch {
            let elapsed = previous.elapsed();
            if elapsed < self.config.min_dispatch_interval {
                let remaining = self.config.min_dispatch_interval - elapsed;
                debug!(remaining_ms = remaining.as_millis() as u64, "Throttled");
                tokio::select! {
                    biased;
                    _ = shutdown.wait() => return Ok(DispatchOutcome::Shutdown),
                    _ = sleep(remaining) => {},
                }
            }
        }

        let job = tokio::select! {
            biased;
            _ = shutdown.wait() => return Ok(DispatchOutcome::Shutdown),
            popped = timeout(self.config.idle_poll_interval, self.queue.pop()) => match popped {
                Ok(job) => job,
                Err(_) => return Ok(DispatchOutcome::Idle),
            },
        };

        let ingestion_id = job.id.clone();
        info!(
            ingestion_id = %ingestion_id,
            priority = %job.priority,
            batches = job.batches().len(),
            "Dispatching ingestion"
        );

        let result = self.process_job(job, shutdown).await;
        *last_dispatch = Some(Instant::now());

        match result {
            Ok(true) => {
                info!(ingestion_id = %ingestion_id, "Ingestion completed");
                Ok(DispatchOutcome::Dispatched(ingestion_id))
            }
            Ok(false) => Ok(DispatchOutcome::Shutdown),
            Err(e) => {
                error!(ingestion_id = %ingestion_id, error = %e, "Ingestion processing failed");
                Err(e)
            }
        }
    }

    /// Drive every batch through TRIGGERED and COMPLETED, in order.
    ///
    /// Returns `false` if shutdown interrupted the job; the in-flight batch then stays TRIGGERED.
    async fn process_job(&self, mut job: IngestionJob, shutdown: &mut ShutdownToken) -> Result<bool> {
        let ingestion_id = job.id.clone();

        for batch in job.batches_mut() {
            batch.trigger()?;
            self.persist_batch_status(&ingestion_id, &batch.id, BatchStatus::Triggered)
                .await?;
            debug!(ingestion_id = %ingestion_id, batch_id = %batch.id, "Batch triggered");

            if !self.run_unit_of_work(&ingestion_id, batch, shutdown).await? {
                warn!(
                    ingestion_id = %ingestion_id,
                    batch_id = %batch.id,
                    "Shutdown during batch processing, batch left triggered"
                );
                return Ok(false);
            }

            batch.complete()?;
            self.persist_batch_status(&ingestion_id, &batch.id, BatchStatus::Completed)
                .await?;
            debug!(ingestion_id = %ingestion_id, batch_id = %batch.id, "Batch completed");
        }

        Ok(true)
    }

    /// Call the processor on its own task so a panic cannot take the loop down
    async fn run_unit_of_work(
        &self,
        ingestion_id: &str,
        batch: &Batch,
        shutdown: &mut ShutdownToken,
    ) -> Result<bool> {
        let processor = Arc::clone(&self.processor);
        let task_ingestion_id = ingestion_id.to_string();
        let task_batch = batch.clone();
        let mut handle =
            tokio::spawn(async move { processor.process(&task_ingestion_id, &task_batch).await });

        tokio::select! {
            biased;
            _ = shutdown.wait() => {
                handle.abort();
                Ok(false)
            }
            joined = &mut handle => match joined {
                Ok(Ok(())) => Ok(true),
                Ok(Err(e)) => Err(e.into()),
                Err(join_err) if join_err.is_panic() => {
                    let message = panic_message(join_err.into_panic());
                    Err(ProcessingError::Panicked(message).into())
                }
                Err(join_err) => Err(AppError::Internal(format!(
                    "batch task cancelled: {}",
                    join_err
                ))),
            },
        }
    }

    /// Full-record read, in-place batch update, full-record rewrite.
    ///
    /// The record is addressed by the owning ingestion's key; no key scan.
    async fn persist_batch_status(
        &self,
        ingestion_id: &str,
        batch_id: &str,
        status: BatchStatus,
    ) -> Result<()> {
        let key = record_key(ingestion_id);
        let mut record = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("status record {}", key)))?;
        record.apply_batch_status(batch_id, status)?;
        self.store.set(&key, &record).await
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
