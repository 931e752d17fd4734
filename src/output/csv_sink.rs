//! CSV output sink
//!
//! The file is truncated and the header written when the sink is created, so
//! the header always precedes every data row and appears exactly once.

use crate::output::traits::{OutputResult, OutputRow, RowSink, COLUMNS};
use std::fs::File;
use std::path::Path;

/// Comma-separated UTF-8 sink with the fixed `COLUMNS` schema
pub struct CsvSink {
    writer: csv::Writer<File>,
    rows_written: u64,
}

impl CsvSink {
    /// Creates (or truncates) `path` and writes the header row
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(COLUMNS)?;
        writer.flush()?;

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Number of data rows written, header excluded
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flushes and closes the file
    pub fn finish(mut self) -> OutputResult<u64> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }
}

impl RowSink for CsvSink {
    fn write_row(&mut self, row: &OutputRow) -> OutputResult<()> {
        self.writer.write_record(row.to_record())?;
        self.rows_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
