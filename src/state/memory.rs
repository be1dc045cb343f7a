use super::{
    LAST_ENQUEUE_TS_KEY, LAST_ERROR_KEY, LAST_JOB_TS_KEY, LAST_STATUS_KEY, SharedState,
    StateSnapshot, counters_from_values, format_timestamp, parse_counter,
};
use crate::error::{Error, Result};
use crate::job::JobHeartbeat;
use crate::metrics::snapshot::{Counter, Counters};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::Notify;

#[derive(Default)]
struct Inner {
    queue: VecDeque<String>,
    values: HashMap<String, String>,
}

/// In-process shared state with the same key layout and string encoding as
/// the Redis store. Consumers park on a [`Notify`] instead of polling.
#[derive(Default)]
pub struct MemoryState {
    inner: Mutex<Inner>,
    available: Notify,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::Internal("memory state lock poisoned".to_string()))
    }

    /// Overwrites a raw key, bypassing the typed API.
    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?
            .values
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.values.get(key).cloned())
    }

    pub fn queue_len(&self) -> Result<usize> {
        Ok(self.lock()?.queue.len())
    }
}

#[async_trait]
impl SharedState for MemoryState {
    async fn push_job(&self, payload: &str) -> Result<()> {
        self.lock()?.queue.push_back(payload.to_string());
        self.available.notify_one();
        Ok(())
    }

    async fn pop_job(&self) -> Result<String> {
        loop {
            let notified = self.available.notified();
            let popped = self.lock()?.queue.pop_front();
            if let Some(payload) = popped {
                return Ok(payload);
            }
            notified.await;
        }
    }

    async fn increment(&self, counter: Counter) -> Result<u64> {
        let mut inner = self.lock()?;
        let current = parse_counter(
            counter.key(),
            inner.values.get(counter.key()).map(String::as_str),
        )?;
        let next = current + 1;
        inner
            .values
            .insert(counter.key().to_string(), next.to_string());
        Ok(next)
    }

    async fn counters(&self) -> Result<Counters> {
        let inner = self.lock()?;
        let get = |counter: Counter| inner.values.get(counter.key()).map(String::as_str);
        counters_from_values([
            get(Counter::Fetch),
            get(Counter::Success),
            get(Counter::Error),
        ])
    }

    async fn record_job_heartbeat(&self, heartbeat: &JobHeartbeat) -> Result<()> {
        let mut inner = self.lock()?;
        inner.values.insert(
            LAST_STATUS_KEY.to_string(),
            heartbeat.status.as_str().to_string(),
        );
        inner
            .values
            .insert(LAST_JOB_TS_KEY.to_string(), format_timestamp(heartbeat.ts));
        inner
            .values
            .insert(LAST_ERROR_KEY.to_string(), heartbeat.error.clone());
        Ok(())
    }

    async fn record_enqueue_heartbeat(&self, ts: DateTime<Utc>) -> Result<()> {
        self.lock()?
            .values
            .insert(LAST_ENQUEUE_TS_KEY.to_string(), format_timestamp(ts));
        Ok(())
    }

    async fn snapshot(&self) -> Result<StateSnapshot> {
        let counters = self.counters().await?;
        let inner = self.lock()?;
        let get = |key: &str| inner.values.get(key).cloned();

        Ok(StateSnapshot {
            counters,
            last_status: get(LAST_STATUS_KEY),
            last_error: get(LAST_ERROR_KEY),
            last_job_ts: get(LAST_JOB_TS_KEY),
            last_enqueue_ts: get(LAST_ENQUEUE_TS_KEY),
        })
    }
}
