use super::OutputHandler;
use crate::error::Result;
use crate::store::MetricsRow;
use async_trait::async_trait;

#[derive(Default)]
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn new() -> Self {
        Self
    }

    pub fn format_row(row: &MetricsRow) -> String {
        let count = row
            .count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{}  count={:<6} fetch={} success={} error={}",
            row.timestamp.to_rfc3339(),
            count,
            row.crawler_fetch_total,
            row.crawler_success_total,
            row.crawler_error_total
        )
    }
}

#[async_trait]
impl OutputHandler for ConsoleOutput {
    async fn write(&mut self, row: &MetricsRow) -> Result<()> {
        println!("{}", Self::format_row(row));
        Ok(())
    }
}
