//! State module for tracking harvest progress
//!
//! The orchestrator moves through a fixed sequence of phases per run:
//! `Init → RegionsDiscovered → SubRegionsDiscovered → Scraped → Enriched → Written → Done`,
//! looping over regions, sub-regions and records. `PhaseTracker` enforces the
//! legal transitions so a logic error surfaces as `HarvestError::InvalidTransition`
//! instead of silently writing rows out of order.

mod harvest_phase;

pub use harvest_phase::{HarvestPhase, PhaseTracker};
