// Domain Layer - Pure business logic and entities

pub mod batch;
pub mod error;
pub mod job;
pub mod priority;
pub mod queue;
pub mod record;

// Re-exports
pub use batch::{Batch, BatchId, BatchStatus, MAX_BATCH_SIZE};
pub use error::DomainError;
pub use job::{validate_ids, IngestionId, IngestionJob, MAX_ITEM_ID, MIN_ITEM_ID};
pub use priority::Priority;
pub use queue::QueueEntry;
pub use record::{record_key, BatchRecord, StatusRecord, RECORD_KEY_PREFIX};
