//! Station table scraping
//!
//! This module handles the listing request for one region/sub-region pair
//! and extracts station records from the response:
//! - Locating the station table by its class list
//! - Skipping the header row
//! - Skipping malformed rows with fewer than three cells
//! - Trimming cell text

use crate::harvest::fetcher::{Fetcher, PageRequest};
use crate::harvest::taxonomy::{Region, SubRegion};
use crate::HarvestError;
use scraper::{Html, Selector};

/// Minimum number of `<td>` cells a row needs to become a record
pub const MIN_CELLS: usize = 3;

/// One station row of a listing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationRecord {
    pub name: String,
    pub address: String,
    pub contact: String,
}

/// Outcome of scraping one sub-region
#[derive(Debug)]
pub enum ScrapeOutcome {
    /// The table was found; it may hold zero records
    Scraped(Vec<StationRecord>),

    /// The response had no station table
    TableMissing,

    /// The listing request failed after all retries
    Failed(HarvestError),
}

impl ScrapeOutcome {
    /// The records to enrich and write; empty for any non-success outcome
    pub fn into_records(self) -> Vec<StationRecord> {
        match self {
            Self::Scraped(records) => records,
            Self::TableMissing | Self::Failed(_) => Vec::new(),
        }
    }
}

/// Builds a CSS selector matching a `<table>` carrying every class in `class_list`
pub(crate) fn table_selector(class_list: &str) -> Option<Selector> {
    let classes: String = class_list
        .split_whitespace()
        .map(|class| format!(".{}", class))
        .collect();
    Selector::parse(&format!("table{}", classes)).ok()
}

/// Extracts station records from a listing document
///
/// Returns `None` if no table with `table_class` exists.
pub fn parse_station_table(document: &Html, table_class: &str) -> Option<Vec<StationRecord>> {
    let table_selector = table_selector(table_class)?;
    let row_selector = Selector::parse("tr").ok()?;
    let cell_selector = Selector::parse("td").ok()?;

    let table = document.select(&table_selector).next()?;

    let records = table
        .select(&row_selector)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<String> = row
                .select(&cell_selector)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .collect();

            if cells.len() < MIN_CELLS {
                return None;
            }

            let mut cells = cells.into_iter();
            Some(StationRecord {
                name: cells.next().unwrap_or_default(),
                address: cells.next().unwrap_or_default(),
                contact: cells.next().unwrap_or_default(),
            })
        })
        .collect();

    Some(records)
}

/// Scrapes the station table of one sub-region
///
/// Posts both selector values to the listing endpoint. Failures are logged
/// with the region and sub-region names and reported in the outcome; they
/// never abort the traversal.
pub async fn scrape_records(
    fetcher: &Fetcher,
    listing_url: &str,
    fields: (&str, &str),
    table_class: &str,
    region: &Region,
    sub_region: &SubRegion,
) -> ScrapeOutcome {
    let (region_field, sub_region_field) = fields;
    let form = [
        (region_field, region.selector_value.as_str()),
        (sub_region_field, sub_region.selector_value.as_str()),
    ];

    let document = match fetcher.fetch(listing_url, PageRequest::Post(&form)).await {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(
                "Failed to retrieve data for {}, {}: {}",
                sub_region.display_name,
                region.display_name,
                e
            );
            return ScrapeOutcome::Failed(e);
        }
    };

    match parse_station_table(&document, table_class) {
        Some(records) if records.is_empty() => {
            tracing::info!(
                "Station table for {}, {} is empty",
                sub_region.display_name,
                region.display_name
            );
            ScrapeOutcome::Scraped(records)
        }
        Some(records) => {
            tracing::debug!(
                "Found {} stations for {}, {}",
                records.len(),
                sub_region.display_name,
                region.display_name
            );
            ScrapeOutcome::Scraped(records)
        }
        None => {
            tracing::warn!(
                "No station table found for {}, {}",
                sub_region.display_name,
                region.display_name
            );
            ScrapeOutcome::TableMissing
        }
    }
}
