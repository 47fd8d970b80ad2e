// Port Layer - Interfaces for external dependencies

pub mod batch_processor;
pub mod id_provider; // For deterministic testing
pub mod status_store;
pub mod time_provider;

// Re-exports
pub use batch_processor::{BatchProcessor, ProcessingError};
pub use id_provider::IdProvider;
pub use status_store::StatusStore;
pub use time_provider::TimeProvider;
