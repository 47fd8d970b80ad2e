// ingestq Infrastructure - System Adapters
// Implements: BatchProcessor

pub mod simulated_batch_api;

pub use simulated_batch_api::SimulatedBatchApi;
