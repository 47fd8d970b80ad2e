// Simulated external batch API
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use ingestq_core::domain::Batch;
use ingestq_core::port::{BatchProcessor, ProcessingError};

/// Stand-in for the external ingestion endpoint: waits `delay`, then succeeds
pub struct SimulatedBatchApi {
    delay: Duration,
    timeout: Option<Duration>,
}

impl SimulatedBatchApi {
    /// Create a simulated API with a fixed per-batch delay
    ///
    /// # Example
    /// ```ignore
    /// let api = SimulatedBatchApi::new(Duration::from_secs(1));
    /// ```
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timeout: None,
        }
    }

    /// Fail a call that takes longer than `limit`
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl BatchProcessor for SimulatedBatchApi {
    async fn process(&self, ingestion_id: &str, batch: &Batch) -> Result<(), ProcessingError> {
        debug!(
            ingestion_id = %ingestion_id,
            batch_id = %batch.id,
            ids = ?batch.ids(),
            delay_ms = self.delay.as_millis() as u64,
            "Calling batch API"
        );

        match self.timeout {
            Some(limit) => {
                if timeout(limit, sleep(self.delay)).await.is_err() {
                    let limit_ms = limit.as_millis() as u64;
                    warn!(
                        ingestion_id = %ingestion_id,
                        batch_id = %batch.id,
                        timeout_ms = limit_ms,
                        "Batch API call timed out"
                    );
                    return Err(ProcessingError::Timeout(limit_ms));
                }
            }
            None => sleep(self.delay).await,
        }

        debug!(ingestion_id = %ingestion_id, batch_id = %batch.id, "Batch API call finished");
        Ok(())
    }
}
