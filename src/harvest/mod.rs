//! Harvest module: fetching, discovery, scraping and enrichment
//!
//! This module contains the core pipeline, including:
//! - HTTP fetching with retry logic
//! - Region and sub-region discovery from selection controls
//! - Station table scraping
//! - Address geocoding
//! - Overall traversal coordination

mod coordinator;
mod fetcher;
mod geocoder;
mod records;
mod taxonomy;

pub use coordinator::Harvester;
pub use fetcher::{build_http_client, pick_user_agent, Fetcher, PageRequest, RetryPolicy};
pub use geocoder::{GeoCoordinate, Geocoder};
pub use records::{parse_station_table, scrape_records, ScrapeOutcome, StationRecord, MIN_CELLS};
pub use taxonomy::{
    discover_regions, discover_sub_regions, extract_options, Discovery, Region, SubRegion,
};

pub(crate) use records::table_selector;
pub(crate) use taxonomy::control_selector;

use crate::config::Config;
use crate::output::{CsvSink, RunStatistics};
use std::path::Path;

/// Runs a complete harvest into a CSV file
///
/// This is the main entry point for a run. It will:
/// 1. Create (truncate) the output file and write the header
/// 2. Discover regions from the listing page
/// 3. Walk the selected regions and sub-regions
/// 4. Geocode and write every station
/// 5. Flush and close the file, on success and on failure
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `api_key` - Key for the geocoding service
/// * `output` - Path of the CSV file to produce
///
/// # Returns
///
/// * `Ok(RunStatistics)` - Harvest completed, possibly with skipped units
/// * `Err(HarvestError)` - Region discovery failed or the file could not be written
pub async fn harvest(
    config: &Config,
    api_key: &str,
    output: &Path,
) -> crate::Result<RunStatistics> {
    let harvester = Harvester::new(config, api_key)?;
    let mut sink = CsvSink::create(output)?;

    let outcome = harvester.run(&mut sink).await;
    let rows = sink.finish()?;

    if outcome.is_ok() {
        tracing::info!(
            "Data has been successfully scraped and saved to {} ({} rows)",
            output.display(),
            rows
        );
    }

    outcome
}
