// Ingest Use Case

use crate::application::scheduler::DispatchScheduler;
use crate::domain::{validate_ids, IngestionId, IngestionJob, Priority};
use crate::error::Result;
use crate::port::{IdProvider, StatusStore};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{info, warn};

/// Ingest request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub ids: Vec<i64>,
    pub priority: Priority,
}

/// Execute the ingest use case
///
/// Persists the initial record first and only enqueues once the write
/// succeeded, so a store failure leaves nothing behind in the queue.
/// The job's creation instant is monotonic and never read from the wall clock.
///
/// # Arguments
///
/// * `store` - Status store
/// * `scheduler` - Dispatch scheduler handle (owns the queue)
/// * `id_provider` - ID generator (injected for determinism)
/// * `req` - Ingest request
pub async fn execute(
    store: &dyn StatusStore,
    scheduler: &DispatchScheduler,
    id_provider: &dyn IdProvider,
    req: IngestRequest,
) -> Result<IngestionId> {
    if let Err(e) = validate_ids(&req.ids) {
        warn!(error = %e, "Rejected ingest request");
        return Err(e.into());
    }

    let ingestion_id = id_provider.generate_id();
    let created_at = Instant::now();

    let job = IngestionJob::new(
        ingestion_id.clone(),
        created_at,
        req.ids,
        req.priority,
        || id_provider.generate_id(),
    )?;

    let record = job.to_record();
    store.set(&record.key(), &record).await?;

    info!(
        ingestion_id = %ingestion_id,
        priority = %job.priority,
        ids = job.ids().len(),
        batches = job.batches().len(),
        "Ingestion accepted"
    );
    scheduler.submit(job);

    Ok(ingestion_id)
}
