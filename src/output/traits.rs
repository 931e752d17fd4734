//! Output sink traits and types
//!
//! This module defines the trait interface for row sinks and the row type
//! they accept.

use crate::harvest::GeoCoordinate;
use thiserror::Error;

/// Column header of every output table, in write order
pub const COLUMNS: [&str; 7] = [
    "City",
    "Area",
    "Station Name",
    "Address",
    "Contact",
    "Latitude",
    "Longitude",
];

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<OutputError> for crate::HarvestError {
    fn from(err: OutputError) -> Self {
        match err {
            OutputError::Io(e) => Self::Io(e),
            OutputError::Csv(e) => Self::Csv(e),
        }
    }
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One enriched station, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub region: String,
    pub sub_region: String,
    pub name: String,
    pub address: String,
    pub contact: String,
    pub coordinate: GeoCoordinate,
}

impl OutputRow {
    /// Renders the row in `COLUMNS` order
    ///
    /// Unresolved coordinates become empty cells.
    pub fn to_record(&self) -> [String; 7] {
        let (latitude, longitude) = match self.coordinate.lat_lng() {
            Some((lat, lng)) => (lat.to_string(), lng.to_string()),
            None => (String::new(), String::new()),
        };

        [
            self.region.clone(),
            self.sub_region.clone(),
            self.name.clone(),
            self.address.clone(),
            self.contact.clone(),
            latitude,
            longitude,
        ]
    }
}

/// Destination for harvested rows
///
/// Implementations write the header when they are opened and append rows in
/// the order they are received. A sink has exactly one writer.
pub trait RowSink {
    /// Appends one row
    fn write_row(&mut self, row: &OutputRow) -> OutputResult<()>;

    /// Flushes buffered rows to the destination
    fn flush(&mut self) -> OutputResult<()>;
}

/// Sink that keeps rows in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub rows: Vec<OutputRow>,
}

impl RowSink for MemorySink {
    fn write_row(&mut self, row: &OutputRow) -> OutputResult<()> {
        self.rows.push(row.clone());
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        Ok(())
    }
}
