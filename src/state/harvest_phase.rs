/// Harvest phase definitions for tracking run progress
///
/// This module defines every phase the orchestrator can be in during a run.
use crate::HarvestError;
use std::fmt;

/// Represents the current phase of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarvestPhase {
    // ===== Active Phases =====
    /// Nothing fetched yet
    Init,

    /// The top-level page yielded at least one region
    RegionsDiscovered,

    /// A region's sub-region control has been read
    SubRegionsDiscovered,

    /// A sub-region's listing table has been scraped
    Scraped,

    /// One station record has been geocoded (resolved or not)
    Enriched,

    /// One output row has been written to the sink
    Written,

    // ===== Terminal Phases =====
    /// Every selected sub-region of every selected region was processed
    Done,

    /// Discovery failed at Init; nothing beyond the header was written
    Failed,
}

impl HarvestPhase {
    /// Returns true if this is a terminal phase (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the orchestrator sits between two sub-region units
    ///
    /// A new sub-region may be scraped, a new region may be expanded or the
    /// run may finish from any of these phases.
    pub fn is_unit_boundary(&self) -> bool {
        matches!(
            self,
            Self::RegionsDiscovered | Self::SubRegionsDiscovered | Self::Scraped | Self::Written
        )
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: HarvestPhase) -> bool {
        match (*self, next) {
            (Self::Init, Self::RegionsDiscovered | Self::Failed) => true,
            (Self::Scraped | Self::Written, Self::Enriched) => true,
            (Self::Enriched, Self::Written) => true,
            (Self::SubRegionsDiscovered | Self::Scraped | Self::Written, Self::Scraped) => true,
            (from, Self::SubRegionsDiscovered | Self::Done) => from.is_unit_boundary(),
            _ => false,
        }
    }

    /// Short lowercase label used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::RegionsDiscovered => "regions_discovered",
            Self::SubRegionsDiscovered => "sub_regions_discovered",
            Self::Scraped => "scraped",
            Self::Enriched => "enriched",
            Self::Written => "written",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for HarvestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks the current phase of one run and rejects illegal transitions
#[derive(Debug)]
pub struct PhaseTracker {
    current: HarvestPhase,
}

impl PhaseTracker {
    /// Creates a tracker in the `Init` phase
    pub fn new() -> Self {
        Self {
            current: HarvestPhase::Init,
        }
    }

    /// Returns the current phase
    pub fn current(&self) -> HarvestPhase {
        self.current
    }

    /// Moves to `next`, or returns `InvalidTransition` leaving the phase unchanged
    pub fn advance(&mut self, next: HarvestPhase) -> crate::Result<()> {
        if !self.current.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.current,
                to: next,
            });
        }

        tracing::debug!("Phase {} -> {}", self.current, next);
        self.current = next;
        Ok(())
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
