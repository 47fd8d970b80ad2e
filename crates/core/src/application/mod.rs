// Application Layer - Use Cases and the Dispatch Scheduler

pub mod ingestion;
pub mod queue;
pub mod scheduler;

// Re-exports
pub use ingestion::{IngestRequest, IngestionService, IngestionStats};
pub use queue::PriorityJobQueue;
pub use scheduler::{
    shutdown_channel, DispatchOutcome, DispatchScheduler, SchedulerConfig, ShutdownSender,
    ShutdownToken,
};
