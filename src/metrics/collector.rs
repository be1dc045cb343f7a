use crate::error::Result;
use crate::job::JobHeartbeat;
use crate::metrics::snapshot::{Counter, Counters};
use crate::state::SharedState;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Records job outcomes into the shared state: counters first, then the
/// worker heartbeat. Every write error is returned to the caller untouched.
#[derive(Clone)]
pub struct MetricsCollector {
    state: Arc<dyn SharedState>,
}

impl MetricsCollector {
    pub fn new(state: Arc<dyn SharedState>) -> Self {
        Self { state }
    }

    /// Counts a dequeued entry that could be parsed into a job.
    pub async fn record_attempt(&self) -> Result<()> {
        self.state.increment(Counter::Fetch).await?;
        Ok(())
    }

    pub async fn record_success(&self, ts: DateTime<Utc>) -> Result<()> {
        self.state.increment(Counter::Success).await?;
        self.state.record_job_heartbeat(&JobHeartbeat::ok(ts)).await
    }

    pub async fn record_failure(&self, ts: DateTime<Utc>, error: &str) -> Result<()> {
        self.state.increment(Counter::Error).await?;
        self.state
            .record_job_heartbeat(&JobHeartbeat::error(ts, error))
            .await
    }

    /// A malformed entry is both an attempt and an error.
    pub async fn record_malformed(&self, ts: DateTime<Utc>, error: &str) -> Result<()> {
        self.state.increment(Counter::Fetch).await?;
        self.record_failure(ts, error).await
    }

    pub async fn totals(&self) -> Result<Counters> {
        self.state.counters().await
    }
}
