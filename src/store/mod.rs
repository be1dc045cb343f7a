//! Durable log store: the append-only `crawl_metrics` history.

use crate::error::{Error, Result};
use crate::metrics::snapshot::Counters;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod memory;
pub mod postgres;
pub mod sqlite;

pub use memory::MemoryLogStore;
pub use postgres::PgLogStore;
pub use sqlite::SqliteLogStore;

pub const TABLE_NAME: &str = "crawl_metrics";

/// One row per processed job. `count` is null when the job failed or could
/// not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub timestamp: DateTime<Utc>,
    pub count: Option<i64>,
    pub crawler_fetch_total: i64,
    pub crawler_success_total: i64,
    pub crawler_error_total: i64,
}

impl MetricsRow {
    pub fn new(timestamp: DateTime<Utc>, count: Option<u64>, totals: &Counters) -> Self {
        Self {
            timestamp,
            count: count.map(saturating_i64),
            crawler_fetch_total: saturating_i64(totals.fetch_total),
            crawler_success_total: saturating_i64(totals.success_total),
            crawler_error_total: saturating_i64(totals.error_total),
        }
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
pub trait LogStore: Send + Sync {
    /// Creates the table when it does not exist yet.
    async fn ensure_table(&self) -> Result<()>;

    async fn append(&self, row: &MetricsRow) -> Result<()>;

    /// Rows oldest first. With a limit, only the most recent `limit` rows.
    async fn rows(&self, limit: Option<usize>) -> Result<Vec<MetricsRow>>;
}

/// Opens the store named by a connection string: `postgres://` or
/// `postgresql://` for PostgreSQL, `sqlite:` for SQLite.
pub async fn connect(dsn: &str) -> Result<Arc<dyn LogStore>> {
    if dsn.starts_with("postgres://") || dsn.starts_with("postgresql://") {
        Ok(Arc::new(PgLogStore::connect(dsn).await?))
    } else if dsn.starts_with("sqlite:") {
        Ok(Arc::new(SqliteLogStore::connect(dsn).await?))
    } else {
        Err(Error::Config(format!(
            "Unsupported log store connection string: {}",
            dsn
        )))
    }
}

pub(crate) fn limit_param(limit: Option<usize>) -> Option<i64> {
    limit.map(|limit| i64::try_from(limit).unwrap_or(i64::MAX))
}
