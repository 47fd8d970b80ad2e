// Ingestion Job Domain Model

use crate::domain::batch::{Batch, BatchStatus, MAX_BATCH_SIZE};
use crate::domain::error::{DomainError, Result};
use crate::domain::priority::Priority;
use crate::domain::record::{BatchRecord, StatusRecord};
use tokio::time::Instant;

/// Ingestion ID (UUID v4)
pub type IngestionId = String;

/// Smallest accepted item identifier
pub const MIN_ITEM_ID: i64 = 1;

/// Largest accepted item identifier (10^9 + 7)
pub const MAX_ITEM_ID: i64 = 1_000_000_007;

/// Check every identifier lies in `[MIN_ITEM_ID, MAX_ITEM_ID]`.
///
/// Fails on the first offending value, in request order.
pub fn validate_ids(ids: &[i64]) -> Result<()> {
    if ids.is_empty() {
        return Err(DomainError::EmptyIdentifiers);
    }
    match ids
        .iter()
        .find(|id| !(MIN_ITEM_ID..=MAX_ITEM_ID).contains(*id))
    {
        Some(bad) => Err(DomainError::InvalidIdentifier(*bad)),
        None => Ok(()),
    }
}

/// One ingestion request, decomposed into batches
///
/// Everything except the batches' status is fixed at construction.
#[derive(Debug, Clone)]
pub struct IngestionJob {
    pub id: IngestionId,
    pub priority: Priority,
    pub created_at: Instant, // monotonic, tie-break only
    ids: Vec<i64>,
    batches: Vec<Batch>,
}

impl IngestionJob {
    /// Validate `ids` and build a job with one pending batch per
    /// consecutive chunk of [`MAX_BATCH_SIZE`].
    ///
    /// # Arguments
    ///
    /// * `id` - Ingestion ID (injected, not generated)
    /// * `created_at` - Monotonic creation instant
    /// * `ids` - Requested item identifiers, in order
    /// * `priority` - Priority label
    /// * `next_batch_id` - Generator for batch IDs
    pub fn new(
        id: impl Into<String>,
        created_at: Instant,
        ids: Vec<i64>,
        priority: Priority,
        mut next_batch_id: impl FnMut() -> String,
    ) -> Result<Self> {
        validate_ids(&ids)?;

        let batches = ids
            .chunks(MAX_BATCH_SIZE)
            .map(|chunk| Batch::new(next_batch_id(), chunk.to_vec()))
            .collect();

        Ok(Self {
            id: id.into(),
            priority,
            created_at,
            ids,
            batches,
        })
    }

    /// Create a job with deterministic IDs (for tests only)
    ///
    /// IDs are `test-N` / `test-N-bM`; `created_at` is the current instant.
    /// Production code should inject IDs via the provider.
    pub fn new_test(ids: Vec<i64>, priority: Priority) -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let id = format!("test-{}", counter);
        let mut batch_no = 0;
        let batch_prefix = id.clone();

        Self::new(id, Instant::now(), ids, priority, move || {
            batch_no += 1;
            format!("{}-b{}", batch_prefix, batch_no)
        })
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn batches_mut(&mut self) -> &mut [Batch] {
        &mut self.batches
    }

    /// Aggregate status derived from the batches
    pub fn overall_status(&self) -> BatchStatus {
        derive_overall_status(self.batches.iter().map(Batch::status))
    }

    /// Serializable projection persisted in the status store
    pub fn to_record(&self) -> StatusRecord {
        StatusRecord {
            ingestion_id: self.id.clone(),
            status: self.overall_status(),
            batches: self
                .batches
                .iter()
                .map(|b| BatchRecord {
                    batch_id: b.id.clone(),
                    ids: b.ids().to_vec(),
                    status: b.status(),
                })
                .collect(),
        }
    }
}

/// COMPLETED iff all completed; else TRIGGERED iff any triggered; else YET_TO_START
pub(crate) fn derive_overall_status(statuses: impl Iterator<Item = BatchStatus> + Clone) -> BatchStatus {
    if statuses.clone().all(|s| s == BatchStatus::Completed) {
        BatchStatus::Completed
    } else if statuses.clone().any(|s| s == BatchStatus::Triggered) {
        BatchStatus::Triggered
    } else {
        BatchStatus::YetToStart
    }
}
