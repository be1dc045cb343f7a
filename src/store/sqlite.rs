use super::{LogStore, MetricsRow, TABLE_NAME, limit_param};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;

/// SQLite-backed log, handy for local runs without PostgreSQL.
///
/// The pool holds a single long-lived connection so `sqlite::memory:`
/// databases survive for the lifetime of the store.
pub struct SqliteLogStore {
    pool: SqlitePool,
}

impl SqliteLogStore {
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(dsn)
            .await?;
        Ok(Self { pool })
    }

    pub async fn open(path: &Path) -> Result<Self> {
        Self::connect(&format!("sqlite:{}?mode=rwc", path.display())).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn decode(row: SqliteRow) -> Result<MetricsRow> {
        Ok(MetricsRow {
            timestamp: row.try_get("timestamp")?,
            count: row.try_get("count")?,
            crawler_fetch_total: row.try_get("crawler_fetch_total")?,
            crawler_success_total: row.try_get("crawler_success_total")?,
            crawler_error_total: row.try_get("crawler_error_total")?,
        })
    }
}

#[async_trait]
impl LogStore for SqliteLogStore {
    async fn ensure_table(&self) -> Result<()> {
        let query = format!(
            r#"CREATE TABLE IF NOT EXISTS {} (
                "timestamp" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                "count" INTEGER,
                crawler_fetch_total INTEGER NOT NULL,
                crawler_success_total INTEGER NOT NULL,
                crawler_error_total INTEGER NOT NULL
            )"#,
            TABLE_NAME
        );
        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    async fn append(&self, row: &MetricsRow) -> Result<()> {
        let query = format!(
            r#"INSERT INTO {} ("timestamp", "count", crawler_fetch_total,
                   crawler_success_total, crawler_error_total)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            TABLE_NAME
        );
        sqlx::query(&query)
            .bind(row.timestamp)
            .bind(row.count)
            .bind(row.crawler_fetch_total)
            .bind(row.crawler_success_total)
            .bind(row.crawler_error_total)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn rows(&self, limit: Option<usize>) -> Result<Vec<MetricsRow>> {
        // A negative LIMIT means no limit in SQLite.
        let query = format!(
            r#"SELECT * FROM (
                SELECT rowid AS seq, "timestamp", "count", crawler_fetch_total,
                       crawler_success_total, crawler_error_total
                FROM {}
                ORDER BY "timestamp" DESC, seq DESC
                LIMIT ?1
            )
            ORDER BY "timestamp" ASC, seq ASC"#,
            TABLE_NAME
        );
        let rows = sqlx::query(&query)
            .bind(limit_param(limit).unwrap_or(-1))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Self::decode).collect()
    }
}
