//! Embedding Cache Updater
//!
//! Fetches embeddings for dataset records missing from the store with a
//! bounded number of requests in flight, then appends the results in
//! dataset order and persists the store once.

use crate::error::EmbeddingError;
use crate::provider::{EmbeddingProvider, TaskType};
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use studysim_core::{Record, RecordId, Result, Vector};
use studysim_storage::{EmbeddingStore, StoredEmbedding};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpdaterConfig {
    pub task_type: TaskType,
    /// Maximum requests in flight
    pub concurrency: usize,
    pub timeout_secs: u64,
    /// Extra attempts after the first failure
    pub max_retries: u32,
    pub retry_base_ms: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            task_type: TaskType::Clustering,
            concurrency: 4,
            timeout_secs: 30,
            max_retries: 2,
            retry_base_ms: 500,
        }
    }
}

impl UpdaterConfig {
    /// Backoff before retry number `attempt` (1-based)
    fn retry_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_base_ms.max(1).saturating_mul(1u64 << exponent))
    }
}

/// Outcome of one cache update
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateReport {
    /// Records missing from the store when the run started
    pub requested: usize,
    pub embedded: Vec<RecordId>,
    pub failed: Vec<(RecordId, String)>,
    /// Missing records without an abstract
    pub skipped: Vec<RecordId>,
}

impl UpdateReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct CacheUpdater<P> {
    provider: P,
    config: UpdaterConfig,
}

impl<P: EmbeddingProvider> CacheUpdater<P> {
    pub fn new(provider: P, config: UpdaterConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Embed every record of `records` the store does not know yet.
    ///
    /// Individual fetch failures are collected in the report; only store
    /// I/O errors are returned as `Err`.
    pub async fn update(
        &self,
        records: &[Record],
        store: &mut EmbeddingStore,
    ) -> Result<UpdateReport> {
        let mut report = UpdateReport::default();

        let mut pending = Vec::new();
        for record in records.iter().filter(|r| !store.contains(r.id)) {
            report.requested += 1;
            match record.abstract_text.as_deref() {
                Some(text) => pending.push((record.id, text)),
                None => {
                    warn!(id = %record.id, "Record has no abstract, skipping embedding");
                    report.skipped.push(record.id);
                }
            }
        }

        if pending.is_empty() {
            info!(cached = store.len(), "Embedding store is up to date");
            return Ok(report);
        }

        info!(
            missing = pending.len(),
            provider = self.provider.name(),
            concurrency = self.config.concurrency,
            "Fetching embeddings"
        );

        let mut fetched: Vec<(usize, std::result::Result<Vector, EmbeddingError>)> =
            stream::iter(pending.iter().enumerate())
                .map(|(pos, (id, text))| async move {
                    let result = self.embed_with_retry(*id, text).await;
                    (pos, result)
                })
                .buffer_unordered(self.config.concurrency.max(1))
                .collect()
                .await;
        fetched.sort_by_key(|(pos, _)| *pos);

        for (pos, result) in fetched {
            let (id, text) = pending[pos];
            let embedding = match result {
                Ok(embedding) => embedding,
                Err(e) => {
                    warn!(%id, error = %e, "Embedding failed");
                    report.failed.push((id, e.to_string()));
                    continue;
                }
            };

            let entry = StoredEmbedding {
                id,
                abstract_text: text.to_string(),
                embedding,
            };
            match store.append(entry) {
                Ok(true) => report.embedded.push(id),
                Ok(false) => debug!(%id, "Already cached"),
                Err(e) => {
                    warn!(%id, error = %e, "Rejected embedding");
                    report.failed.push((id, e.to_string()));
                }
            }
        }

        if !report.embedded.is_empty() {
            store.persist()?;
        }

        info!(
            embedded = report.embedded.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "Embedding cache updated"
        );
        Ok(report)
    }

    async fn embed_with_retry(
        &self,
        id: RecordId,
        text: &str,
    ) -> std::result::Result<Vector, EmbeddingError> {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let mut attempt = 0u32;

        loop {
            let request = self.provider.embed(text, self.config.task_type);
            let result = match tokio::time::timeout(timeout, request).await {
                Ok(result) => result,
                Err(_) => Err(EmbeddingError::Timeout(self.config.timeout_secs)),
            };

            match result {
                Ok(vector) if vector.is_empty() => return Err(EmbeddingError::EmptyEmbedding),
                Ok(vector) => return Ok(vector),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.config.retry_delay(attempt);
                    debug!(%id, attempt, ?delay, error = %e, "Retrying embedding");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use studysim_storage::DEFAULT_EMBEDDING_COLUMN;
    use tempfile::TempDir;

    /// Deterministic provider: vector derived from text length, scripted failures
    #[derive(Default)]
    struct MockProvider {
        calls: AtomicUsize,
        /// text -> number of leading failures with the given status
        failures: Mutex<HashMap<String, (usize, u16)>>,
        hang: bool,
    }

    impl MockProvider {
        fn failing(text: &str, times: usize, status: u16) -> Self {
            let provider = Self::default();
            provider
                .failures
                .lock()
                .unwrap()
                .insert(text.to_string(), (times, status));
            provider
        }
    }

    impl EmbeddingProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn embed(
            &self,
            text: &str,
            _task: TaskType,
        ) -> std::result::Result<Vector, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            let status = {
                let mut failures = self.failures.lock().unwrap();
                match failures.get_mut(text) {
                    Some((remaining, status)) if *remaining > 0 => {
                        *remaining -= 1;
                        Some(*status)
                    }
                    _ => None,
                }
            };
            if let Some(status) = status {
                return Err(EmbeddingError::Status {
                    status,
                    body: "scripted".to_string(),
                });
            }
            Ok(Vector::new(vec![text.len() as f32, 1.0]))
        }
    }

    /// Sleeps inside every call and records the peak number of calls in flight
    #[derive(Default)]
    struct SlowProvider {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl EmbeddingProvider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        async fn embed(
            &self,
            text: &str,
            _task: TaskType,
        ) -> std::result::Result<Vector, EmbeddingError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Vector::new(vec![text.len() as f32, 1.0]))
        }
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new(RecordId(1), Some("one".to_string())),
            Record::new(RecordId(2), Some("two two".to_string())),
            Record::new(RecordId(3), None),
            Record::new(RecordId(4), Some("four".to_string())),
        ]
    }

    fn fast_config() -> UpdaterConfig {
        UpdaterConfig {
            retry_base_ms: 1,
            ..UpdaterConfig::default()
        }
    }

    fn store(dir: &TempDir) -> EmbeddingStore {
        EmbeddingStore::create(dir.path().join("embeddings.csv"), DEFAULT_EMBEDDING_COLUMN)
            .unwrap()
    }

    #[tokio::test]
    async fn test_update_fetches_missing_in_dataset_order() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let updater = CacheUpdater::new(MockProvider::default(), fast_config());

        let report = updater.update(&records(), &mut store).await.unwrap();

        assert_eq!(report.requested, 4);
        assert_eq!(report.embedded, vec![RecordId(1), RecordId(2), RecordId(4)]);
        assert_eq!(report.skipped, vec![RecordId(3)]);
        assert!(report.is_complete());
        assert_eq!(updater.provider().calls.load(Ordering::SeqCst), 3);

        let ids: Vec<RecordId> = store.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![RecordId(1), RecordId(2), RecordId(4)]);
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn test_second_run_makes_no_calls() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let updater = CacheUpdater::new(MockProvider::default(), fast_config());
        updater.update(&records(), &mut store).await.unwrap();

        let path = store.path().to_path_buf();
        let before = std::fs::read_to_string(&path).unwrap();

        let mut reopened = EmbeddingStore::open(&path, DEFAULT_EMBEDDING_COLUMN).unwrap();
        let report = updater.update(&records(), &mut reopened).await.unwrap();

        assert!(report.embedded.is_empty());
        assert_eq!(updater.provider().calls.load(Ordering::SeqCst), 3);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let provider = MockProvider::failing("two two", usize::MAX, 400);
        let updater = CacheUpdater::new(provider, fast_config());

        let report = updater.update(&records(), &mut store).await.unwrap();

        assert_eq!(report.embedded, vec![RecordId(1), RecordId(4)]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, RecordId(2));
        assert!(!store.contains(RecordId(2)));
        // a 400 is not retried
        assert_eq!(updater.provider().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retryable_failure_recovers() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let provider = MockProvider::failing("one", 2, 503);
        let updater = CacheUpdater::new(provider, fast_config());

        let report = updater.update(&records(), &mut store).await.unwrap();

        assert!(report.is_complete());
        assert!(store.contains(RecordId(1)));
        assert_eq!(updater.provider().calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let provider = MockProvider::failing("one", usize::MAX, 429);
        let updater = CacheUpdater::new(provider, fast_config());

        let report = updater.update(&records(), &mut store).await.unwrap();

        assert_eq!(report.failed.len(), 1);
        // 1 + max_retries attempts for "one", one each for the others
        assert_eq!(updater.provider().calls.load(Ordering::SeqCst), 3 + 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_failure() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let provider = MockProvider {
            hang: true,
            ..MockProvider::default()
        };
        let config = UpdaterConfig {
            max_retries: 0,
            ..fast_config()
        };
        let updater = CacheUpdater::new(provider, config);

        let report = updater.update(&records(), &mut store).await.unwrap();

        assert!(report.embedded.is_empty());
        assert_eq!(report.failed.len(), 3);
        assert!(report.failed[0].1.contains("timed out"));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_requests_are_bounded() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let records: Vec<Record> = (1..=20)
            .map(|id| Record::new(RecordId(id), Some(format!("abstract number {id}"))))
            .collect();
        let config = UpdaterConfig {
            concurrency: 3,
            ..fast_config()
        };
        let updater = CacheUpdater::new(SlowProvider::default(), config);

        let report = updater.update(&records, &mut store).await.unwrap();

        assert_eq!(report.embedded.len(), 20);
        assert_eq!(store.len(), 20);
        let peak = updater.provider().max_in_flight.load(Ordering::SeqCst);
        assert!(peak <= 3, "{peak} requests in flight");
        assert!(peak > 1, "requests never overlapped");
        assert_eq!(updater.provider().in_flight.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_retry_delay_grows() {
        let config = UpdaterConfig::default();
        assert_eq!(config.retry_delay(1), Duration::from_millis(500));
        assert_eq!(config.retry_delay(2), Duration::from_millis(1000));
        assert_eq!(config.retry_delay(3), Duration::from_millis(2000));
    }
}
