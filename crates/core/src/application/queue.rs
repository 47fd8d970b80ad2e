//! Priority job queue
//!
//! Binary heap of pending jobs ordered by `(priority rank, created_at, admission seq)`.
//! `pop` suspends the calling task while the queue is empty.

use crate::domain::{IngestionJob, QueueEntry};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Pending jobs, served strictly by priority then age
pub struct PriorityJobQueue {
    heap: Mutex<BinaryHeap<Reverse<QueueEntry>>>,
    next_seq: AtomicU64,
    notify: Notify,
}

impl Default for PriorityJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityJobQueue {
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            next_seq: AtomicU64::new(0),
            notify: Notify::new(),
        }
    }

    /// Insert a job (O(log n)) and wake a waiting consumer
    pub fn push(&self, job: IngestionJob) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let entry = QueueEntry::new(job, seq);
        self.lock().push(Reverse(entry));
        self.notify.notify_one();
    }

    /// Remove the smallest entry without waiting
    pub fn try_pop(&self) -> Option<IngestionJob> {
        self.lock().pop().map(|Reverse(entry)| entry.job)
    }

    /// Remove the smallest entry, waiting for one if the queue is empty
    ///
    /// Cancel-safe: dropping the future before it resolves removes nothing.
    pub async fn pop(&self) -> IngestionJob {
        loop {
            if let Some(job) = self.try_pop() {
                return job;
            }
            // notify_one stores a permit when nobody is waiting, so a push
            // between try_pop and here is not lost
            self.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BinaryHeap<Reverse<QueueEntry>>> {
        // A poisoned heap is still structurally valid
        self.heap.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
