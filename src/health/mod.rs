//! Health aggregation: liveness verdicts derived from heartbeat ages.

use crate::error::Result;
use crate::metrics::snapshot::Counters;
use crate::state::{SharedState, StateSnapshot, parse_timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub mod server;

pub use server::router;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub enqueue_max: Duration,
    pub worker_max: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            enqueue_max: Duration::from_secs(20),
            worker_max: Duration::from_secs(25),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Ok,
    StaleOrDown,
}

impl ComponentStatus {
    fn from_ok(ok: bool) -> Self {
        if ok {
            ComponentStatus::Ok
        } else {
            ComponentStatus::StaleOrDown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Components {
    pub scheduler: ComponentStatus,
    pub worker: ComponentStatus,
    pub last_job_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub last_enqueue_ts: Option<String>,
    pub last_job_ts: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: OverallStatus,
    pub components: Components,
    pub timestamps: Timestamps,
    pub counters: Counters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == OverallStatus::Ok
    }
}

/// A heartbeat is fresh when present and no older than `max`. Timestamps
/// from the future count as age zero.
pub fn is_fresh(ts: Option<DateTime<Utc>>, now: DateTime<Utc>, max: Duration) -> bool {
    match ts {
        Some(ts) => (now - ts).to_std().unwrap_or(Duration::ZERO) <= max,
        None => false,
    }
}

/// Derives the verdicts for one snapshot at instant `now`.
pub fn evaluate(
    snapshot: StateSnapshot,
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> HealthReport {
    let scheduler_ok = is_fresh(
        parse_timestamp(snapshot.last_enqueue_ts.as_deref()),
        now,
        thresholds.enqueue_max,
    );
    let worker_ok = is_fresh(
        parse_timestamp(snapshot.last_job_ts.as_deref()),
        now,
        thresholds.worker_max,
    );
    let last_ok = snapshot.last_status.as_deref() == Some("ok");
    let overall_ok = scheduler_ok && worker_ok && last_ok;

    HealthReport {
        status: if overall_ok {
            OverallStatus::Ok
        } else {
            OverallStatus::Error
        },
        components: Components {
            scheduler: ComponentStatus::from_ok(scheduler_ok),
            worker: ComponentStatus::from_ok(worker_ok),
            last_job_status: snapshot
                .last_status
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
        },
        timestamps: Timestamps {
            last_enqueue_ts: snapshot.last_enqueue_ts,
            last_job_ts: snapshot.last_job_ts,
        },
        counters: snapshot.counters,
        last_error: snapshot.last_error.filter(|e| !e.is_empty()),
    }
}

/// Read-only view over the shared state.
#[derive(Clone)]
pub struct HealthAggregator {
    state: Arc<dyn SharedState>,
    thresholds: Thresholds,
}

impl HealthAggregator {
    pub fn new(state: Arc<dyn SharedState>, thresholds: Thresholds) -> Self {
        Self { state, thresholds }
    }

    pub async fn report(&self) -> Result<HealthReport> {
        let snapshot = self.state.snapshot().await?;
        Ok(evaluate(snapshot, &self.thresholds, Utc::now()))
    }

    pub async fn counters(&self) -> Result<Counters> {
        self.state.counters().await
    }
}
