//! Harvest coordinator - main traversal logic
//!
//! This module drives one run from the top-level page to the last row:
//! - Discovering regions (fatal if none)
//! - Expanding each selected region into sub-regions
//! - Scraping, geocoding and writing every station of each selected sub-region
//! - Pacing between sub-regions
//!
//! Everything runs strictly sequentially: one outstanding request at a time.

use crate::config::{Config, SiteConfig, TraversalConfig};
use crate::harvest::fetcher::{build_http_client, pick_user_agent, Fetcher, PageRequest, RetryPolicy};
use crate::harvest::geocoder::Geocoder;
use crate::harvest::records::{scrape_records, ScrapeOutcome, StationRecord};
use crate::harvest::taxonomy::{self, discover_sub_regions, Discovery, Region, SubRegion};
use crate::output::{OutputRow, RowSink, RunStatistics};
use crate::state::{HarvestPhase, PhaseTracker};
use crate::{ConfigError, HarvestError};

/// Main harvest coordinator structure
pub struct Harvester {
    site: SiteConfig,
    traversal: TraversalConfig,
    fetcher: Fetcher,
    geocoder: Geocoder,
}

impl Harvester {
    /// Creates a harvester for one run
    ///
    /// Picks the client identity for this process and builds the shared HTTP
    /// client.
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `api_key` - Key for the geocoding service
    pub fn new(config: &Config, api_key: &str) -> crate::Result<Self> {
        let user_agent = pick_user_agent(&config.fetch.user_agents).ok_or_else(|| {
            ConfigError::Validation("user-agents must contain at least one entry".to_string())
        })?;
        tracing::debug!("Client identity for this run: {}", user_agent);

        let client = build_http_client(&config.fetch, user_agent)?;
        let fetcher = Fetcher::new(client.clone(), RetryPolicy::from(&config.fetch));
        let geocoder = Geocoder::new(client, config.geocoding.endpoint.clone(), api_key);

        Ok(Self {
            site: config.site.clone(),
            traversal: config.traversal.clone(),
            fetcher,
            geocoder,
        })
    }

    /// Runs the traversal, writing every row to `sink`
    ///
    /// Only a failure to discover regions is returned as an error (along with
    /// sink I/O errors). Region and sub-region failures are logged, counted
    /// and skipped.
    pub async fn run<S: RowSink + ?Sized>(&self, sink: &mut S) -> crate::Result<RunStatistics> {
        let mut phase = PhaseTracker::new();
        let mut stats = RunStatistics::new();

        tracing::info!("Fetching regions from {}", self.site.listing_url);
        let regions = match self.discover_regions().await {
            Ok(regions) => regions,
            Err(e) => {
                phase.advance(HarvestPhase::Failed)?;
                tracing::error!("Region discovery failed: {}", e);
                return Err(e);
            }
        };
        phase.advance(HarvestPhase::RegionsDiscovered)?;

        let selected = self.traversal.max_regions.select(&regions);
        stats.regions_discovered = regions.len() as u64;
        stats.regions_selected = selected.len() as u64;
        tracing::info!(
            "Discovered {} regions, visiting {} ({})",
            regions.len(),
            selected.len(),
            self.traversal.max_regions
        );

        for region in selected {
            self.harvest_region(region, sink, &mut phase, &mut stats)
                .await?;
        }

        sink.flush()?;
        phase.advance(HarvestPhase::Done)?;
        stats.finish();

        tracing::info!(
            "Harvest completed: {} rows written ({} without coordinates)",
            stats.rows_written,
            stats.coordinates_unresolved
        );

        Ok(stats)
    }

    /// Fetches the top-level page and reads the region control
    async fn discover_regions(&self) -> crate::Result<Vec<Region>> {
        let document = self
            .fetcher
            .fetch(&self.site.listing_url, PageRequest::Get)
            .await?;

        let regions = taxonomy::discover_regions(&document, &self.site.region_control).into_items();
        if regions.is_empty() {
            return Err(HarvestError::NoRegions {
                url: self.site.listing_url.clone(),
            });
        }

        Ok(regions)
    }

    /// Expands one region and harvests its selected sub-regions
    async fn harvest_region<S: RowSink + ?Sized>(
        &self,
        region: &Region,
        sink: &mut S,
        phase: &mut PhaseTracker,
        stats: &mut RunStatistics,
    ) -> crate::Result<()> {
        let discovery = match discover_sub_regions(
            &self.fetcher,
            &self.site.listing_url,
            &self.site.region_control,
            &self.site.sub_region_control,
            region,
        )
        .await
        {
            Ok(discovery) => discovery,
            Err(e) => {
                tracing::warn!(
                    "Skipping region {}: sub-region request failed: {}",
                    region.display_name,
                    e
                );
                stats.regions_failed += 1;
                return Ok(());
            }
        };
        phase.advance(HarvestPhase::SubRegionsDiscovered)?;

        let sub_regions = match discovery {
            Discovery::Found(sub_regions) => sub_regions,
            Discovery::ControlMissing { .. } => {
                stats.controls_missing += 1;
                return Ok(());
            }
        };

        if sub_regions.is_empty() {
            tracing::info!("No sub-regions listed for {}", region.display_name);
        }

        let selected = self.traversal.max_sub_regions_per_region.select(&sub_regions);
        stats.sub_regions_discovered += sub_regions.len() as u64;
        stats.sub_regions_selected += selected.len() as u64;

        for sub_region in selected {
            tracing::info!(
                "Scraping data for area: {} in city: {}",
                sub_region.display_name,
                region.display_name
            );

            let outcome = scrape_records(
                &self.fetcher,
                &self.site.listing_url,
                (&self.site.region_control, &self.site.sub_region_control),
                &self.site.table_class,
                region,
                sub_region,
            )
            .await;
            phase.advance(HarvestPhase::Scraped)?;

            match outcome {
                ScrapeOutcome::Scraped(records) => {
                    stats.sub_regions_scraped += 1;
                    self.enrich_and_write(region, sub_region, records, sink, phase, stats)
                        .await?;
                }
                ScrapeOutcome::TableMissing => stats.tables_missing += 1,
                ScrapeOutcome::Failed(_) => stats.sub_regions_failed += 1,
            }

            tokio::time::sleep(self.traversal.area_delay()).await;
        }

        Ok(())
    }

    /// Geocodes each record and appends it to the sink, in table order
    async fn enrich_and_write<S: RowSink + ?Sized>(
        &self,
        region: &Region,
        sub_region: &SubRegion,
        records: Vec<StationRecord>,
        sink: &mut S,
        phase: &mut PhaseTracker,
        stats: &mut RunStatistics,
    ) -> crate::Result<()> {
        for record in records {
            let coordinate = self.geocoder.resolve(&record.address).await;
            phase.advance(HarvestPhase::Enriched)?;

            if !coordinate.is_resolved() {
                stats.coordinates_unresolved += 1;
            }

            let row = OutputRow {
                region: region.display_name.clone(),
                sub_region: sub_region.display_name.clone(),
                name: record.name,
                address: record.address,
                contact: record.contact,
                coordinate,
            };
            sink.write_row(&row)?;
            phase.advance(HarvestPhase::Written)?;
            stats.rows_written += 1;
        }

        Ok(())
    }
}
