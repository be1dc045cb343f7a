use super::OutputHandler;
use crate::error::Result;
use crate::store::MetricsRow;
use async_trait::async_trait;
use std::path::PathBuf;

/// Header row first; a null count becomes an empty field.
pub struct CsvOutput {
    writer: csv::Writer<std::fs::File>,
}

impl CsvOutput {
    pub fn new(path: PathBuf) -> Result<Self> {
        let writer = csv::Writer::from_path(path)?;
        Ok(Self { writer })
    }
}

#[async_trait]
impl OutputHandler for CsvOutput {
    async fn write(&mut self, row: &MetricsRow) -> Result<()> {
        self.writer.serialize(row)?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
