//! Station-Harvest: a polite two-level listing harvester
//!
//! This crate walks a form-driven listing site (region → sub-region), scrapes
//! the station table of every selected sub-region, enriches each station with
//! coordinates from a geocoding service and writes the result as CSV.

pub mod config;
pub mod harvest;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for Station-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to retrieve {url} after {attempts} attempts")]
    FetchExhausted { url: String, attempts: u32 },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("No regions could be discovered at {url}")]
    NoRegions { url: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::HarvestPhase,
        to: state::HarvestPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Returns true if this error ends the whole run rather than a single unit
    pub fn is_fatal_discovery(&self) -> bool {
        matches!(self, Self::FetchExhausted { .. } | Self::NoRegions { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing geocoding API key (set [geocoding] api-key, --api-key or GEOCODING_API_KEY)")]
    MissingApiKey,
}

/// Result type alias for Station-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use harvest::{harvest, GeoCoordinate, Region, StationRecord, SubRegion};
pub use output::{CsvSink, OutputRow, RowSink, RunStatistics};
pub use state::HarvestPhase;
