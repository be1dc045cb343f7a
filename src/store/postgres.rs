use super::{LogStore, MetricsRow, TABLE_NAME, limit_param};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};

pub struct PgLogStore {
    pool: PgPool,
}

impl PgLogStore {
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPool::connect(dsn).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode(row: PgRow) -> Result<MetricsRow> {
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
impl LogStore for PgLogStore {
    async fn ensure_table(&self) -> Result<()> {
        let query = format!(
            r#"CREATE TABLE IF NOT EXISTS {} (
                "timestamp" TIMESTAMPTZ NOT NULL DEFAULT now(),
                "count" INTEGER,
                crawler_fetch_total BIGINT NOT NULL,
                crawler_success_total BIGINT NOT NULL,
                crawler_error_total BIGINT NOT NULL
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
               VALUES ($1, $2, $3, $4, $5)"#,
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
        // LIMIT NULL means no limit in PostgreSQL.
        let query = format!(
            r#"SELECT * FROM (
                SELECT "timestamp", "count"::BIGINT AS "count", crawler_fetch_total,
                       crawler_success_total, crawler_error_total
                FROM {}
                ORDER BY "timestamp" DESC
                LIMIT $1
            ) recent
            ORDER BY "timestamp" ASC"#,
            TABLE_NAME
        );
        let rows = sqlx::query(&query)
            .bind(limit_param(limit))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Self::decode).collect()
    }
}
