// Batch Processor Port
// The opaque per-batch unit of work (a call to an external batch API)

use crate::domain::Batch;
use async_trait::async_trait;
use thiserror::Error;

/// Processing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("External call failed: {0}")]
    Failed(String),

    #[error("External call timed out after {0}ms")]
    Timeout(u64),

    #[error("Processor panicked: {0}")]
    Panicked(String),
}

/// Batch Processor trait
///
/// Implementations:
/// - SimulatedBatchApi (infra-system): fixed delay, always succeeds
/// - MockBatchProcessor: scripted behavior for tests
#[async_trait]
pub trait BatchProcessor: Send + Sync {
    /// Process one batch of an ingestion
    ///
    /// Must yield while waiting; dropping the future abandons the call.
    async fn process(&self, ingestion_id: &str, batch: &Batch) -> Result<(), ProcessingError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock processor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Succeed immediately
        Success,
        /// Succeed after sleeping (tokio time, so paused clocks apply)
        Delay(Duration),
        /// Always fail with message
        Fail(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
    }

    /// One recorded call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ProcessedBatch {
        pub ingestion_id: String,
        pub batch_id: String,
        pub ids: Vec<i64>,
    }

    /// Mock Batch Processor for testing
    pub struct MockBatchProcessor {
        behavior: Arc<Mutex<MockBehavior>>,
        failing_ingestions: Arc<Mutex<HashSet<String>>>,
        calls: Arc<Mutex<Vec<ProcessedBatch>>>,
    }

    impl MockBatchProcessor {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                failing_ingestions: Arc::new(Mutex::new(HashSet::new())),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }
        pub fn new_delay(delay: Duration) -> Self {
            Self::new(MockBehavior::Delay(delay))
        }
        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }
        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }
        /// Fail every batch of one ingestion, regardless of behavior
        pub fn fail_for(&self, ingestion_id: impl Into<String>) {
            self.failing_ingestions
                .lock()
                .unwrap()
                .insert(ingestion_id.into());
        }
        pub fn calls(&self) -> Vec<ProcessedBatch> {
            self.calls.lock().unwrap().clone()
        }
        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
        /// Ingestion IDs in the order they were first processed
        pub fn ingestion_order(&self) -> Vec<String> {
            let mut order: Vec<String> = Vec::new();
            for call in self.calls.lock().unwrap().iter() {
                if order.last() != Some(&call.ingestion_id) {
                    order.push(call.ingestion_id.clone());
                }
            }
            order
        }
    }

    #[async_trait]
    impl BatchProcessor for MockBatchProcessor {
        async fn process(&self, ingestion_id: &str, batch: &Batch) -> Result<(), ProcessingError> {
            self.calls.lock().unwrap().push(ProcessedBatch {
                ingestion_id: ingestion_id.to_string(),
                batch_id: batch.id.clone(),
                ids: batch.ids().to_vec(),
            });

            if self.failing_ingestions.lock().unwrap().contains(ingestion_id) {
                return Err(ProcessingError::Failed(format!(
                    "scripted failure for {}",
                    ingestion_id
                )));
            }

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Success => Ok(()),
                MockBehavior::Delay(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(())
                }
                MockBehavior::Fail(msg) => Err(ProcessingError::Failed(msg)),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
            }
        }
    }
}
