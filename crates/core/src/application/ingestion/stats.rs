// Stats Use Case

use crate::application::scheduler::DispatchScheduler;
use crate::domain::{BatchStatus, RECORD_KEY_PREFIX};
use crate::error::Result;
use crate::port::StatusStore;
use serde::Serialize;

/// Counts of persisted ingestions by overall status, plus live queue depth
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionStats {
    pub queued_jobs: usize,
    pub total_ingestions: usize,
    pub yet_to_start: usize,
    pub triggered: usize,
    pub completed: usize,
}

impl IngestionStats {
    /// Persisted ingestions not yet completed
    pub fn unfinished(&self) -> usize {
        self.yet_to_start + self.triggered
    }
}

/// Scan every status record and tally them
pub async fn execute(store: &dyn StatusStore, scheduler: &DispatchScheduler) -> Result<IngestionStats> {
    let mut stats = IngestionStats {
        queued_jobs: scheduler.queued_jobs(),
        ..Default::default()
    };

    for key in store.scan_keys(RECORD_KEY_PREFIX).await? {
        // A key can disappear between scan and read if retention runs externally
        let Some(record) = store.get(&key).await? else {
            continue;
        };
        stats.total_ingestions += 1;
        match record.status {
            BatchStatus::YetToStart => stats.yet_to_start += 1,
            BatchStatus::Triggered => stats.triggered += 1,
            BatchStatus::Completed => stats.completed += 1,
        }
    }

    Ok(stats)
}
