//! Run statistics
//!
//! Counters collected by the orchestrator while it walks the taxonomy, and a
//! plain-text report printed when the run ends.

use chrono::{DateTime, Utc};

/// Harvest run statistics summary
#[derive(Debug, Clone)]
pub struct RunStatistics {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Regions offered by the top-level page
    pub regions_discovered: u64,

    /// Regions visited after applying the region limit
    pub regions_selected: u64,

    /// Regions whose sub-region request failed after retries
    pub regions_failed: u64,

    /// Sub-region controls absent from a region response
    pub controls_missing: u64,

    /// Sub-regions offered across all visited regions
    pub sub_regions_discovered: u64,

    /// Sub-regions visited after applying the per-region limit
    pub sub_regions_selected: u64,

    /// Sub-regions whose listing table was parsed
    pub sub_regions_scraped: u64,

    /// Sub-regions whose listing request failed after retries
    pub sub_regions_failed: u64,

    /// Listing responses without a station table
    pub tables_missing: u64,

    /// Data rows written to the sink
    pub rows_written: u64,

    /// Rows written without coordinates
    pub coordinates_unresolved: u64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            regions_discovered: 0,
            regions_selected: 0,
            regions_failed: 0,
            controls_missing: 0,
            sub_regions_discovered: 0,
            sub_regions_selected: 0,
            sub_regions_scraped: 0,
            sub_regions_failed: 0,
            tables_missing: 0,
            rows_written: 0,
            coordinates_unresolved: 0,
        }
    }

    /// Marks the run as finished now
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Share of written rows that carry coordinates, as a percentage
    pub fn resolution_rate(&self) -> f64 {
        if self.rows_written == 0 {
            return 0.0;
        }
        let resolved = self.rows_written - self.coordinates_unresolved;
        (resolved as f64 / self.rows_written as f64) * 100.0
    }

    /// True if any unit was skipped because of a failure or missing markup
    pub fn has_gaps(&self) -> bool {
        self.regions_failed > 0
            || self.controls_missing > 0
            || self.sub_regions_failed > 0
            || self.tables_missing > 0
    }
}

impl Default for RunStatistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Regions:");
    println!("  Discovered: {}", stats.regions_discovered);
    println!("  Selected: {}", stats.regions_selected);
    println!("  Failed: {}", stats.regions_failed);
    println!("  Sub-region control missing: {}", stats.controls_missing);
    println!();

    println!("Sub-regions:");
    println!("  Discovered: {}", stats.sub_regions_discovered);
    println!("  Selected: {}", stats.sub_regions_selected);
    println!("  Scraped: {}", stats.sub_regions_scraped);
    println!("  Failed: {}", stats.sub_regions_failed);
    println!("  Station table missing: {}", stats.tables_missing);
    println!();

    println!("Rows:");
    println!("  Written: {}", stats.rows_written);
    println!("  Without coordinates: {}", stats.coordinates_unresolved);
    println!(
        "  Geocoding success rate: {:.1}%",
        stats.resolution_rate()
    );

    if let Some(seconds) = stats.duration_seconds() {
        println!();
        println!("Elapsed: {} seconds", seconds);
    }

    if stats.has_gaps() {
        println!();
        println!("Some units were skipped; see the log for details.");
    }
}
