// Queue entry ordering

use crate::domain::job::IngestionJob;
use std::cmp::Ordering;
use tokio::time::Instant;

/// A job waiting in the priority queue
///
/// Ordered by `(rank, created_at, seq)` ascending. `created_at` is a monotonic
/// instant, so wall-clock steps never reorder jobs; `seq` is the admission
/// counter and only decides between jobs sharing an instant.
#[derive(Debug)]
pub struct QueueEntry {
    pub rank: u8,
    pub created_at: Instant,
    pub seq: u64,
    pub job: IngestionJob,
}

impl QueueEntry {
    pub fn new(job: IngestionJob, seq: u64) -> Self {
        Self {
            rank: job.priority.rank(),
            created_at: job.created_at,
            seq,
            job,
        }
    }

    fn sort_key(&self) -> (u8, Instant, u64) {
        (self.rank, self.created_at, self.seq)
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Priority;
    use std::time::Duration;

    fn entry(priority: Priority, created_at: Instant, seq: u64) -> QueueEntry {
        let job = IngestionJob::new(format!("j{}", seq), created_at, vec![1], priority, || {
            "b".to_string()
        })
        .unwrap();
        QueueEntry::new(job, seq)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_priority_beats_age() {
        let t0 = Instant::now();
        let old_low = entry(Priority::Low, t0, 0);
        let new_high = entry(Priority::High, t0 + ms(10), 1);
        assert!(new_high < old_low);
    }

    #[test]
    fn test_age_breaks_priority_ties() {
        let t0 = Instant::now();
        let first = entry(Priority::Medium, t0, 5);
        let second = entry(Priority::Medium, t0 + ms(1), 0);
        assert!(first < second);
    }

    #[test]
    fn test_sequence_breaks_timestamp_ties() {
        let t0 = Instant::now();
        let a = entry(Priority::Medium, t0, 1);
        let b = entry(Priority::Medium, t0, 2);
        assert!(a < b);
    }
}
