#![allow(dead_code)]

use async_trait::async_trait;
use crawl_monitor::error::{Error, Result};
use chrono::{DateTime, Utc};
use crawl_monitor::job::JobHeartbeat;
use crawl_monitor::state::StateSnapshot;
use crawl_monitor::store::{LogStore, MetricsRow};
use crawl_monitor::{Counter, Counters, FetchError, MemoryState, PageFetcher, SharedState};
use std::sync::Arc;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Replays canned fetch results in order; `Ok(0)` once exhausted.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<VecDeque<std::result::Result<u64, FetchError>>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new(responses: Vec<std::result::Result<u64, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn count_occurrences(
        &self,
        _url: &str,
        _target: &str,
    ) -> std::result::Result<u64, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(0))
    }
}

/// A log store whose database is gone.
pub struct UnreachableLogStore;

#[async_trait]
impl LogStore for UnreachableLogStore {
    async fn ensure_table(&self) -> Result<()> {
        Ok(())
    }

    async fn append(&self, _row: &MetricsRow) -> Result<()> {
        Err(Error::Internal("log store unreachable".to_string()))
    }

    async fn rows(&self, _limit: Option<usize>) -> Result<Vec<MetricsRow>> {
        Err(Error::Internal("log store unreachable".to_string()))
    }
}

/// Shared state that keeps the queue and counters but cannot write the
/// worker heartbeat.
pub struct HeartbeatlessState {
    pub inner: Arc<MemoryState>,
}

#[async_trait]
impl SharedState for HeartbeatlessState {
    async fn push_job(&self, payload: &str) -> Result<()> {
        self.inner.push_job(payload).await
    }

    async fn pop_job(&self) -> Result<String> {
        self.inner.pop_job().await
    }

    async fn increment(&self, counter: Counter) -> Result<u64> {
        self.inner.increment(counter).await
    }

    async fn counters(&self) -> Result<Counters> {
        self.inner.counters().await
    }

    async fn record_job_heartbeat(&self, _heartbeat: &JobHeartbeat) -> Result<()> {
        Err(Error::Internal("connection reset".to_string()))
    }

    async fn record_enqueue_heartbeat(&self, ts: DateTime<Utc>) -> Result<()> {
        self.inner.record_enqueue_heartbeat(ts).await
    }

    async fn snapshot(&self) -> Result<StateSnapshot> {
        self.inner.snapshot().await
    }
}

pub fn timeout_error(url: &str) -> FetchError {
    FetchError::Timeout {
        url: url.to_string(),
    }
}

pub const JOB: &str = r#"{"url": "https://example/", "target": "football"}"#;

/// Polls `store` until it holds `expected` rows or a second passes.
pub async fn wait_for_rows(store: &dyn LogStore, expected: usize) -> Vec<MetricsRow> {
    for _ in 0..100 {
        let rows = store.rows(None).await.unwrap();
        if rows.len() >= expected {
            return rows;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    store.rows(None).await.unwrap()
}
