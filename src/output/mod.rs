use crate::error::Result;
use crate::store::{LogStore, MetricsRow};
use async_trait::async_trait;

pub mod console;
pub mod csv;
pub mod json;

#[async_trait]
pub trait OutputHandler: Send + Sync {
    async fn write(&mut self, row: &MetricsRow) -> Result<()>;
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Streams every row through `handler`, then closes it.
pub async fn export(rows: &[MetricsRow], handler: &mut dyn OutputHandler) -> Result<usize> {
    for row in rows {
        handler.write(row).await?;
    }
    handler.close().await?;
    Ok(rows.len())
}

/// Reads the log store first and only then opens the handler, so a store
/// failure never leaves a truncated output file behind.
pub async fn export_log<F>(
    store: &dyn LogStore,
    limit: Option<usize>,
    open: F,
) -> Result<usize>
where
    F: FnOnce() -> Result<Box<dyn OutputHandler>>,
{
    let rows = store.rows(limit).await?;
    let mut handler = open()?;
    export(&rows, handler.as_mut()).await
}
