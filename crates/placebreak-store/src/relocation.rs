//! Move engine: relocating tags when blocks are displaced.
//!
//! A move is planned against a snapshot. Every source location is read first,
//! then all touched locations (sources and targets) are cleared, then the
//! carried tags are written. Backends execute the plan as one unit: a single
//! transaction for SQL, a single write lock for memory. Chained pairs, where
//! one pair's target is another's source, therefore shift together like a
//! row of pushed blocks.

use std::collections::BTreeSet;

use placebreak_types::{DisplacementPair, DisplacementSet, Location, Tag};

/// The writes produced by one displacement batch.
#[derive(Debug, Clone, Default)]
pub(crate) struct RelocationPlan {
    cleared: BTreeSet<Location>,
    carried: Vec<Tag>,
}

impl RelocationPlan {
    /// Start a plan that clears every location `displacements` touches.
    pub(crate) fn new(backend: &'static str, displacements: &DisplacementSet) -> Self {
        let chained = displacements.chained_locations();
        if !chained.is_empty() {
            tracing::debug!(
                backend,
                chained = chained.len(),
                "Displacement batch contains chained locations, shifting as a snapshot"
            );
        }
        Self {
            cleared: displacements.flatten(),
            carried: Vec::new(),
        }
    }

    /// Record what was found at `pair.old()`. Untagged sources carry nothing.
    pub(crate) fn carry(&mut self, pair: &DisplacementPair, found: Option<Tag>) {
        if let Some(tag) = found {
            self.carried.push(tag.relocated(pair.new_location().clone()));
        }
    }

    /// Locations to empty before writing.
    pub(crate) const fn cleared(&self) -> &BTreeSet<Location> {
        &self.cleared
    }

    /// Tags to write once the locations are cleared.
    pub(crate) fn carried(&self) -> &[Tag] {
        &self.carried
    }
}
