// Ingestion Service - producer and reader use cases

pub mod ingest;
pub mod stats;

pub use ingest::IngestRequest;
pub use stats::IngestionStats;

use crate::application::scheduler::DispatchScheduler;
use crate::domain::{record_key, IngestionId, StatusRecord};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, StatusStore};
use std::sync::Arc;

/// Ingestion Service
///
/// Shares the scheduler handle with the dispatch loop; never touches batch status itself.
pub struct IngestionService {
    store: Arc<dyn StatusStore>,
    scheduler: Arc<DispatchScheduler>,
    id_provider: Arc<dyn IdProvider>,
}

impl IngestionService {
    pub fn new(
        store: Arc<dyn StatusStore>,
        scheduler: Arc<DispatchScheduler>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            store,
            scheduler,
            id_provider,
        }
    }

    /// Validate, persist and enqueue a new ingestion
    pub async fn ingest(&self, req: IngestRequest) -> Result<IngestionId> {
        ingest::execute(
            self.store.as_ref(),
            self.scheduler.as_ref(),
            self.id_provider.as_ref(),
            req,
        )
        .await
    }

    /// Read the persisted record verbatim
    pub async fn get_status(&self, ingestion_id: &str) -> Result<StatusRecord> {
        self.store
            .get(&record_key(ingestion_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Ingestion job not found".to_string()))
    }

    pub async fn stats(&self) -> Result<IngestionStats> {
        stats::execute(self.store.as_ref(), self.scheduler.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::scheduler::{shutdown_channel, DispatchOutcome, SchedulerConfig};
    use crate::domain::{BatchStatus, DomainError, Priority};
    use crate::port::batch_processor::mocks::MockBatchProcessor;
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::status_store::mocks::InMemoryStatusStore;

    struct Fixture {
        service: IngestionService,
        scheduler: Arc<DispatchScheduler>,
        store: Arc<InMemoryStatusStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStatusStore::new());
        let scheduler = Arc::new(DispatchScheduler::new(
            store.clone(),
            Arc::new(MockBatchProcessor::new_success()),
            SchedulerConfig::default(),
        ));
        let service = IngestionService::new(
            store.clone(),
            scheduler.clone(),
            Arc::new(SequentialIdProvider::new("id")),
        );
        Fixture {
            service,
            scheduler,
            store,
        }
    }

    fn request(ids: Vec<i64>, priority: Priority) -> IngestRequest {
        IngestRequest { ids, priority }
    }

    #[tokio::test]
    async fn test_ingest_persists_initial_record() {
        let f = fixture();
        let id = f
            .service
            .ingest(request(vec![1, 2, 3, 4, 5], Priority::High))
            .await
            .unwrap();

        assert_eq!(f.store.write_count(), 1, "exactly one durable write");
        assert_eq!(f.scheduler.queued_jobs(), 1, "exactly one queue insertion");

        let record = f.service.get_status(&id).await.unwrap();
        assert_eq!(record.ingestion_id, id);
        assert_eq!(record.status, BatchStatus::YetToStart);
        assert_eq!(record.batches.len(), 2);
        assert_eq!(record.batches[0].ids, vec![1, 2, 3]);
        assert_eq!(record.batches[1].ids, vec![4, 5]);
        assert!(record
            .batches
            .iter()
            .all(|b| b.status == BatchStatus::YetToStart));
    }

    #[tokio::test]
    async fn test_invalid_id_creates_nothing() {
        let f = fixture();
        for bad in [0, 1_000_000_008, -1] {
            let err = f
                .service
                .ingest(request(vec![1, bad, 2], Priority::High))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                AppError::Domain(DomainError::InvalidIdentifier(v)) if v == bad
            ));
            assert!(err.to_string().contains(&bad.to_string()));
        }
        assert!(f.store.is_empty());
        assert_eq!(f.scheduler.queued_jobs(), 0);
    }

    #[tokio::test]
    async fn test_empty_ids_rejected() {
        let f = fixture();
        let err = f
            .service
            .ingest(request(vec![], Priority::Low))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::EmptyIdentifiers)));
    }

    #[tokio::test]
    async fn test_store_failure_fails_ingest_and_enqueues_nothing() {
        let f = fixture();
        f.store.set_unavailable(true);

        let err = f
            .service
            .ingest(request(vec![1, 2], Priority::Medium))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
        assert_eq!(f.scheduler.queued_jobs(), 0);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let f = fixture();
        let err = f.service.get_status("nonexistent").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_creation_time_orders_equal_priorities() {
        let f = fixture();
        let first = f
            .service
            .ingest(request(vec![1], Priority::Medium))
            .await
            .unwrap();
        tokio::time::advance(std::time::Duration::from_millis(1)).await;
        let second = f
            .service
            .ingest(request(vec![2], Priority::Medium))
            .await
            .unwrap();

        let (_tx, mut token) = shutdown_channel();
        let a = f.scheduler.dispatch_next(&mut token).await.unwrap();
        let b = f.scheduler.dispatch_next(&mut token).await.unwrap();
        assert_eq!(a, DispatchOutcome::Dispatched(first));
        assert_eq!(b, DispatchOutcome::Dispatched(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_instant_keeps_admission_order() {
        let f = fixture();
        let mut admitted = Vec::new();
        for id in 1..=3 {
            admitted.push(
                f.service
                    .ingest(request(vec![id], Priority::Medium))
                    .await
                    .unwrap(),
            );
        }

        let (_tx, mut token) = shutdown_channel();
        for expected in admitted {
            assert_eq!(
                f.scheduler.dispatch_next(&mut token).await.unwrap(),
                DispatchOutcome::Dispatched(expected)
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_tally() {
        let f = fixture();
        let done = f
            .service
            .ingest(request(vec![1, 2, 3], Priority::High))
            .await
            .unwrap();
        f.service
            .ingest(request(vec![4], Priority::Low))
            .await
            .unwrap();

        let (_tx, mut token) = shutdown_channel();
        assert_eq!(
            f.scheduler.dispatch_next(&mut token).await.unwrap(),
            DispatchOutcome::Dispatched(done)
        );

        let stats = f.service.stats().await.unwrap();
        assert_eq!(
            stats,
            IngestionStats {
                queued_jobs: 1,
                total_ingestions: 2,
                yet_to_start: 1,
                triggered: 0,
                completed: 1,
            }
        );
        assert_eq!(stats.unfinished(), 1);
    }
}
