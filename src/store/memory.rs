use super::{LogStore, MetricsRow};
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Keeps rows in insertion order; used by tests and single-process setups.
#[derive(Default)]
pub struct MemoryLogStore {
    rows: Mutex<Vec<MetricsRow>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn ensure_table(&self) -> Result<()> {
        Ok(())
    }

    async fn append(&self, row: &MetricsRow) -> Result<()> {
        self.rows.lock().await.push(row.clone());
        Ok(())
    }

    async fn rows(&self, limit: Option<usize>) -> Result<Vec<MetricsRow>> {
        let rows = self.rows.lock().await;
        let skip = limit.map_or(0, |limit| rows.len().saturating_sub(limit));
        Ok(rows[skip..].to_vec())
    }
}
