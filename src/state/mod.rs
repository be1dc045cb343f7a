//! Shared state store: the job queue, the lifetime counters and the
//! heartbeats every component coordinates through.

use crate::error::{Error, Result};
use crate::job::JobHeartbeat;
use crate::metrics::snapshot::{Counter, Counters};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

pub mod memory;
pub mod redis;

pub use memory::MemoryState;
pub use self::redis::RedisState;

pub const QUEUE_KEY: &str = "crawl_queue";
pub const LAST_STATUS_KEY: &str = "crawler:last_status";
pub const LAST_JOB_TS_KEY: &str = "crawler:last_ts";
pub const LAST_ERROR_KEY: &str = "crawler:last_error";
pub const LAST_ENQUEUE_TS_KEY: &str = "crawler:last_enqueue_ts";

/// Everything the health aggregator reads, as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub counters: Counters,
    pub last_status: Option<String>,
    pub last_error: Option<String>,
    pub last_job_ts: Option<String>,
    pub last_enqueue_ts: Option<String>,
}

#[async_trait]
pub trait SharedState: Send + Sync {
    /// Appends a serialized job to the tail of the queue.
    async fn push_job(&self, payload: &str) -> Result<()>;

    /// Removes and returns the head of the queue, suspending until one exists.
    async fn pop_job(&self) -> Result<String>;

    /// Atomically increments a counter and returns its new value.
    async fn increment(&self, counter: Counter) -> Result<u64>;

    async fn counters(&self) -> Result<Counters>;

    /// Writes status, timestamp and last error together.
    async fn record_job_heartbeat(&self, heartbeat: &JobHeartbeat) -> Result<()>;

    async fn record_enqueue_heartbeat(&self, ts: DateTime<Utc>) -> Result<()>;

    async fn snapshot(&self) -> Result<StateSnapshot>;
}

/// ISO-8601 UTC with microseconds and an explicit `+00:00` offset.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Lenient parse: anything that is not an RFC 3339 timestamp reads as absent.
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Absent counters read as zero; anything else must be a decimal integer.
pub(crate) fn parse_counter(key: &str, raw: Option<&str>) -> Result<u64> {
    match raw {
        None => Ok(0),
        Some(value) if value.is_empty() => Ok(0),
        Some(value) => value.trim().parse().map_err(|_| Error::CorruptState {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

pub(crate) fn counters_from_values(values: [Option<&str>; 3]) -> Result<Counters> {
    let [fetch, success, error] = values;
    Ok(Counters {
        fetch_total: parse_counter(Counter::Fetch.key(), fetch)?,
        success_total: parse_counter(Counter::Success.key(), success)?,
        error_total: parse_counter(Counter::Error.key(), error)?,
    })
}
