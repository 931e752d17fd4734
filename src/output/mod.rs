//! Output module for persisting harvested rows
//!
//! This module handles:
//! - The fixed column schema of the output table
//! - Writing enriched rows through the `RowSink` trait
//! - The CSV sink used by the command-line tool
//! - Recording run statistics

mod csv_sink;
pub mod stats;
mod traits;

pub use csv_sink::CsvSink;
pub use stats::{print_statistics, RunStatistics};
pub use traits::{MemorySink, OutputError, OutputResult, OutputRow, RowSink, COLUMNS};
