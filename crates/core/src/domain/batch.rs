// Batch Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Batch ID (UUID v4)
pub type BatchId = String;

/// Maximum number of item identifiers carried by one batch
pub const MAX_BATCH_SIZE: usize = 3;

/// Batch lifecycle status
///
/// Only moves forward: `YetToStart -> Triggered -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    YetToStart,
    Triggered,
    Completed,
}

impl BatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchStatus::YetToStart => "yet_to_start",
            BatchStatus::Triggered => "triggered",
            BatchStatus::Completed => "completed",
        }
    }

    /// Whether `self -> next` is a legal single step
    pub fn can_transition_to(self, next: BatchStatus) -> bool {
        matches!(
            (self, next),
            (BatchStatus::YetToStart, BatchStatus::Triggered)
                | (BatchStatus::Triggered, BatchStatus::Completed)
        )
    }

    pub(crate) fn check_transition(self, next: BatchStatus) -> Result<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::InvalidStateTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sub-group of at most [`MAX_BATCH_SIZE`] item identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub id: BatchId,
    ids: Vec<i64>,
    status: BatchStatus,
}

impl Batch {
    /// Create a pending batch. `ids` must be non-empty and at most [`MAX_BATCH_SIZE`] long.
    pub(crate) fn new(id: impl Into<String>, ids: Vec<i64>) -> Self {
        debug_assert!(!ids.is_empty() && ids.len() <= MAX_BATCH_SIZE);
        Self {
            id: id.into(),
            ids,
            status: BatchStatus::YetToStart,
        }
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    /// YET_TO_START -> TRIGGERED
    pub fn trigger(&mut self) -> Result<()> {
        self.status.check_transition(BatchStatus::Triggered)?;
        self.status = BatchStatus::Triggered;
        Ok(())
    }

    /// TRIGGERED -> COMPLETED
    pub fn complete(&mut self) -> Result<()> {
        self.status.check_transition(BatchStatus::Completed)?;
        self.status = BatchStatus::Completed;
        Ok(())
    }
}
