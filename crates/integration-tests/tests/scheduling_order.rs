//! Scheduling Order Tests
//!
//! Priority-then-age ordering and the minimum gap between dispatches,
//! with the scheduler running as it does in the daemon.

use async_trait::async_trait;
use ingestq_core::application::{
    shutdown_channel, DispatchOutcome, DispatchScheduler, IngestRequest, IngestionService,
    SchedulerConfig,
};
use ingestq_core::domain::{Batch, BatchStatus, IngestionId, Priority};
use ingestq_core::port::batch_processor::mocks::MockBatchProcessor;
use ingestq_core::port::id_provider::mocks::SequentialIdProvider;
use ingestq_core::port::time_provider::mocks::MockTimeProvider;
use ingestq_core::port::{BatchProcessor, ProcessingError, StatusStore, TimeProvider};
use ingestq_infra_sqlite::{create_pool, run_migrations, SqliteStatusStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

const FLOOR: Duration = Duration::from_millis(200);

struct Harness {
    service: IngestionService,
    scheduler: Arc<DispatchScheduler>,
    clock: Arc<MockTimeProvider>,
}

async fn harness(processor: Arc<dyn BatchProcessor>) -> Harness {
    let pool = create_pool(":memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let clock = Arc::new(MockTimeProvider::new(10_000));
    let store_clock: Arc<dyn TimeProvider> = clock.clone();
    let store: Arc<dyn StatusStore> = Arc::new(SqliteStatusStore::new(pool, store_clock));

    let scheduler = Arc::new(DispatchScheduler::new(
        store.clone(),
        processor,
        SchedulerConfig {
            min_dispatch_interval: FLOOR,
            idle_poll_interval: Duration::from_millis(10),
            error_backoff: Duration::from_millis(20),
        },
    ));
    let service = IngestionService::new(
        store,
        scheduler.clone(),
        Arc::new(SequentialIdProvider::new("ing")),
    );
    Harness {
        service,
        scheduler,
        clock,
    }
}

impl Harness {
    async fn ingest(&self, ids: Vec<i64>, priority: Priority) -> IngestionId {
        self.service
            .ingest(IngestRequest { ids, priority })
            .await
            .unwrap()
    }

    async fn wait_completed(&self, ids: &[IngestionId]) {
        let deadline = Instant::now() + Duration::from_secs(10);
        for id in ids {
            loop {
                let record = self.service.get_status(id).await.unwrap();
                if record.status == BatchStatus::Completed {
                    break;
                }
                assert!(Instant::now() < deadline, "{} did not complete", id);
                sleep(Duration::from_millis(5)).await;
            }
        }
    }
}

/// Test 1: J1(LOW), J2(HIGH), J3(MEDIUM) queued together -> J2, J3, J1
#[tokio::test]
async fn test_priority_order() {
    let processor = Arc::new(MockBatchProcessor::new_success());
    let h = harness(processor.clone()).await;

    let j1 = h.ingest(vec![1, 2, 3], Priority::Low).await;
    let j2 = h.ingest(vec![4, 5, 6], Priority::High).await;
    let j3 = h.ingest(vec![7, 8, 9], Priority::Medium).await;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let runner = h.scheduler.clone();
    let handle = tokio::spawn(async move { runner.run(shutdown_rx).await });

    h.wait_completed(&[j1.clone(), j2.clone(), j3.clone()]).await;
    shutdown_tx.shutdown();
    handle.await.unwrap().unwrap();

    assert_eq!(processor.ingestion_order(), vec![j2, j3, j1]);
}

/// Test 2: Equal priority -> oldest first
#[tokio::test]
async fn test_equal_priority_oldest_first() {
    let processor = Arc::new(MockBatchProcessor::new_success());
    let h = harness(processor.clone()).await;

    let older = h.ingest(vec![1], Priority::Medium).await;
    let newer = h.ingest(vec![2], Priority::Medium).await;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let runner = h.scheduler.clone();
    let handle = tokio::spawn(async move { runner.run(shutdown_rx).await });

    h.wait_completed(&[older.clone(), newer.clone()]).await;
    shutdown_tx.shutdown();
    handle.await.unwrap().unwrap();

    assert_eq!(processor.ingestion_order(), vec![older, newer]);
}

/// Test 2b: The wall clock stepping back between two ingests does not let
/// the later one jump ahead
#[tokio::test]
async fn test_wall_clock_step_back_keeps_admission_order() {
    let processor = Arc::new(MockBatchProcessor::new_success());
    let h = harness(processor.clone()).await;

    let first = h.ingest(vec![1], Priority::Medium).await;
    h.clock.set(9_000);
    let second = h.ingest(vec![3], Priority::Medium).await;

    let (shutdown_tx, mut token) = shutdown_channel();
    assert_eq!(
        h.scheduler.dispatch_next(&mut token).await.unwrap(),
        DispatchOutcome::Dispatched(first.clone())
    );
    assert_eq!(
        h.scheduler.dispatch_next(&mut token).await.unwrap(),
        DispatchOutcome::Dispatched(second.clone())
    );
    shutdown_tx.shutdown();

    assert_eq!(processor.ingestion_order(), vec![first, second]);
}

/// Records when each batch started and finished
#[derive(Default)]
struct RecordingProcessor {
    delay: Duration,
    spans: Mutex<Vec<(String, Instant, Instant)>>,
}

#[async_trait]
impl BatchProcessor for RecordingProcessor {
    async fn process(&self, ingestion_id: &str, _batch: &Batch) -> Result<(), ProcessingError> {
        let started = Instant::now();
        sleep(self.delay).await;
        self.spans
            .lock()
            .unwrap()
            .push((ingestion_id.to_string(), started, Instant::now()));
        Ok(())
    }
}

/// Test 3: End of one dispatch to start of the next is at least the floor;
/// batches inside one job run back to back
#[tokio::test]
async fn test_dispatch_floor() {
    let processor = Arc::new(RecordingProcessor {
        delay: Duration::from_millis(30),
        ..Default::default()
    });
    let h = harness(processor.clone()).await;

    let a = h.ingest(vec![1, 2, 3, 4, 5, 6, 7], Priority::High).await;
    let b = h.ingest(vec![8], Priority::High).await;
    let c = h.ingest(vec![9], Priority::Low).await;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let runner = h.scheduler.clone();
    let handle = tokio::spawn(async move { runner.run(shutdown_rx).await });

    h.wait_completed(&[a.clone(), b.clone(), c.clone()]).await;
    shutdown_tx.shutdown();
    handle.await.unwrap().unwrap();

    let spans = processor.spans.lock().unwrap().clone();
    let owners: Vec<&str> = spans.iter().map(|(id, _, _)| id.as_str()).collect();
    assert_eq!(owners, vec![a.as_str(), a.as_str(), a.as_str(), b.as_str(), c.as_str()]);

    for pair in spans.windows(2) {
        let (prev_owner, _, prev_end) = &pair[0];
        let (next_owner, next_start, _) = &pair[1];
        let gap = next_start.duration_since(*prev_end);
        if prev_owner == next_owner {
            assert!(gap < FLOOR, "batches of one job should not be throttled");
        } else {
            assert!(gap >= FLOOR, "dispatch gap {:?} below floor", gap);
        }
    }
}

/// Test 4: A HIGH job arriving mid-dispatch waits for the running job,
/// then overtakes the LOW job that was queued before it
#[tokio::test]
async fn test_late_high_priority_overtakes_but_does_not_preempt() {
    let processor = Arc::new(MockBatchProcessor::new_delay(Duration::from_millis(100)));
    let h = harness(processor.clone()).await;

    let running = h.ingest(vec![1, 2, 3, 4, 5, 6], Priority::Low).await;
    let waiting = h.ingest(vec![7], Priority::Low).await;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let runner = h.scheduler.clone();
    let handle = tokio::spawn(async move { runner.run(shutdown_rx).await });

    // Let the first job start
    let deadline = Instant::now() + Duration::from_secs(5);
    while processor.call_count() == 0 {
        assert!(Instant::now() < deadline);
        sleep(Duration::from_millis(5)).await;
    }
    let urgent = h.ingest(vec![8], Priority::High).await;

    h.wait_completed(&[running.clone(), waiting.clone(), urgent.clone()])
        .await;
    shutdown_tx.shutdown();
    handle.await.unwrap().unwrap();

    assert_eq!(processor.ingestion_order(), vec![running, urgent, waiting]);
}
