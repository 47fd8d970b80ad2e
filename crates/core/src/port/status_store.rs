// Status Store Port (Interface)

use crate::domain::StatusRecord;
use crate::error::Result;
use async_trait::async_trait;

/// Durable key-value store for status records
///
/// Implementations only need whole-record reads and writes; there is no
/// partial update. Connection failures surface as `AppError::StoreUnavailable`.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Read the record stored under `key`
    async fn get(&self, key: &str) -> Result<Option<StatusRecord>>;

    /// Overwrite the record stored under `key`
    async fn set(&self, key: &str, record: &StatusRecord) -> Result<()>;

    /// List every key starting with `prefix`
    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>>;
}

// ============================================================================
// In-memory implementation (tests and `INGESTQ_STORE=memory`)
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Mutex, MutexGuard};

    /// Most recent writes kept for inspection
    const WRITE_LOG_CAPACITY: usize = 1024;

    /// In-memory status store
    ///
    /// Keeps a bounded log of recent writes so tests can check the order of transitions.
    #[derive(Default)]
    pub struct InMemoryStatusStore {
        records: Mutex<BTreeMap<String, StatusRecord>>,
        writes: Mutex<VecDeque<StatusRecord>>,
        write_count: AtomicUsize,
        unavailable: AtomicBool,
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    impl InMemoryStatusStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent call fail with `StoreUnavailable`
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Recent records written, oldest first
        pub fn writes(&self) -> Vec<StatusRecord> {
            lock(&self.writes).iter().cloned().collect()
        }

        /// Total writes since creation
        pub fn write_count(&self) -> usize {
            self.write_count.load(Ordering::SeqCst)
        }

        pub fn len(&self) -> usize {
            lock(&self.records).len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn check_available(&self) -> Result<()> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(AppError::StoreUnavailable(
                    "in-memory store marked unavailable".to_string(),
                ));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl StatusStore for InMemoryStatusStore {
        async fn get(&self, key: &str) -> Result<Option<StatusRecord>> {
            self.check_available()?;
            Ok(lock(&self.records).get(key).cloned())
        }

        async fn set(&self, key: &str, record: &StatusRecord) -> Result<()> {
            self.check_available()?;
            lock(&self.records).insert(key.to_string(), record.clone());

            let mut writes = lock(&self.writes);
            if writes.len() == WRITE_LOG_CAPACITY {
                writes.pop_front();
            }
            writes.push_back(record.clone());
            self.write_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>> {
            self.check_available()?;
            Ok(lock(&self.records)
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::{IngestionJob, Priority};

        #[tokio::test]
        async fn test_set_get_scan() {
            let store = InMemoryStatusStore::new();
            let record = IngestionJob::new_test(vec![1, 2], Priority::High)
                .unwrap()
                .to_record();

            store.set(&record.key(), &record).await.unwrap();
            store.set("other:1", &record).await.unwrap();

            assert_eq!(store.get(&record.key()).await.unwrap(), Some(record.clone()));
            assert_eq!(store.get("ingestion:missing").await.unwrap(), None);
            assert_eq!(
                store.scan_keys("ingestion:").await.unwrap(),
                vec![record.key()]
            );
            assert_eq!(store.write_count(), 2);
        }

        #[tokio::test]
        async fn test_unavailable() {
            let store = InMemoryStatusStore::new();
            store.set_unavailable(true);
            assert!(matches!(
                store.get("ingestion:x").await,
                Err(AppError::StoreUnavailable(_))
            ));
        }
    }
}
