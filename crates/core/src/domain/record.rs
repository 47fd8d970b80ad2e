// Persisted status record (the externally visible projection of a job)

use crate::domain::batch::BatchStatus;
use crate::domain::error::{DomainError, Result};
use crate::domain::job::derive_overall_status;
use serde::{Deserialize, Serialize};

/// Key prefix shared by every status record
pub const RECORD_KEY_PREFIX: &str = "ingestion:";

/// Store key for an ingestion ID
pub fn record_key(ingestion_id: &str) -> String {
    format!("{}{}", RECORD_KEY_PREFIX, ingestion_id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub batch_id: String,
    pub ids: Vec<i64>,
    pub status: BatchStatus,
}

/// `{ingestion_id, status, batches: [{batch_id, ids, status}]}`
///
/// `status` is precomputed on every write; readers never recompute it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub ingestion_id: String,
    pub status: BatchStatus,
    pub batches: Vec<BatchRecord>,
}

impl StatusRecord {
    pub fn key(&self) -> String {
        record_key(&self.ingestion_id)
    }

    /// Move one batch forward and refresh the overall status.
    ///
    /// Re-applying the status a batch already has is a no-op, so a rewrite
    /// after a lost response does not fail.
    pub fn apply_batch_status(&mut self, batch_id: &str, status: BatchStatus) -> Result<()> {
        let batch = self
            .batches
            .iter_mut()
            .find(|b| b.batch_id == batch_id)
            .ok_or_else(|| DomainError::BatchNotFound {
                ingestion_id: self.ingestion_id.clone(),
                batch_id: batch_id.to_string(),
            })?;

        if batch.status != status {
            batch.status.check_transition(status)?;
            batch.status = status;
        }

        self.status = derive_overall_status(self.batches.iter().map(|b| b.status));
        Ok(())
    }
}
