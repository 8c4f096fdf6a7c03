//! Displacements of blocks moved together in one batch.
//!
//! When a piston extends or retracts, every block it moves goes from an old
//! location to a new one at the same instant. A [`DisplacementSet`] captures
//! that batch so tags can follow their blocks.
//!
//! Construction validates the batch up front. A pair that does not move, or
//! two pairs fighting over the same source or target, indicates a bug in the
//! caller and is rejected with a [`DisplacementError`].

use std::collections::BTreeSet;

use crate::location::{Direction, Location};

/// Errors raised while building displacements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DisplacementError {
    /// The old and new locations are identical.
    #[error("displacement does not move anything: {location}")]
    SameLocation {
        /// The location given as both old and new.
        location: Location,
    },

    /// Applying the direction would leave the coordinate range.
    #[error("moving {location} overflows the coordinate range")]
    CoordinateOverflow {
        /// The location that cannot be moved.
        location: Location,
    },

    /// Two pairs move the same block to different places.
    #[error("location {location} is the source of more than one displacement")]
    ConflictingSource {
        /// The duplicated source location.
        location: Location,
    },

    /// Two pairs move different blocks onto the same place.
    #[error("location {location} is the target of more than one displacement")]
    ConflictingTarget {
        /// The duplicated target location.
        location: Location,
    },
}

/// One block moving from `old` to `new`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DisplacementPair {
    /// Where the block was.
    old: Location,
    /// Where the block is now.
    new: Location,
}

impl DisplacementPair {
    /// Create a pair.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::SameLocation`] if `old == new`.
    pub fn new(old: Location, new: Location) -> Result<Self, DisplacementError> {
        if old == new {
            return Err(DisplacementError::SameLocation { location: old });
        }
        Ok(Self { old, new })
    }

    /// Return the location the block left.
    pub const fn old(&self) -> &Location {
        &self.old
    }

    /// Return the location the block arrived at.
    pub const fn new_location(&self) -> &Location {
        &self.new
    }
}

/// A deduplicated batch of simultaneous displacements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplacementSet {
    pairs: BTreeSet<DisplacementPair>,
}

impl DisplacementSet {
    /// An empty batch.
    pub const fn empty() -> Self {
        Self {
            pairs: BTreeSet::new(),
        }
    }

    /// Build a batch from pairs, dropping exact duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::ConflictingSource`] or
    /// [`DisplacementError::ConflictingTarget`] when two distinct pairs share
    /// an old or a new location.
    pub fn new(
        pairs: impl IntoIterator<Item = DisplacementPair>,
    ) -> Result<Self, DisplacementError> {
        let pairs: BTreeSet<DisplacementPair> = pairs.into_iter().collect();

        let mut sources = BTreeSet::new();
        let mut targets = BTreeSet::new();
        for pair in &pairs {
            if !sources.insert(&pair.old) {
                return Err(DisplacementError::ConflictingSource {
                    location: pair.old.clone(),
                });
            }
            if !targets.insert(&pair.new) {
                return Err(DisplacementError::ConflictingTarget {
                    location: pair.new.clone(),
                });
            }
        }

        Ok(Self { pairs })
    }

    /// Build the batch produced by moving every location one step in
    /// `direction`, as a piston does.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::SameLocation`] for a zero direction and
    /// [`DisplacementError::CoordinateOverflow`] if a block would leave the
    /// coordinate range.
    pub fn from_blocks(
        locations: impl IntoIterator<Item = Location>,
        direction: Direction,
    ) -> Result<Self, DisplacementError> {
        let pairs = locations
            .into_iter()
            .map(|old| {
                let new = old
                    .offset(direction)
                    .ok_or_else(|| DisplacementError::CoordinateOverflow {
                        location: old.clone(),
                    })?;
                DisplacementPair::new(old, new)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(pairs)
    }

    /// Number of pairs in the batch.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over the pairs in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = &DisplacementPair> {
        self.pairs.iter()
    }

    /// Every location touched by the batch (old ∪ new).
    pub fn flatten(&self) -> BTreeSet<Location> {
        self.pairs
            .iter()
            .flat_map(|pair| [pair.old.clone(), pair.new.clone()])
            .collect()
    }

    /// Locations that are the target of one pair and the source of another.
    ///
    /// A piston pushing a row of blocks produces these. Relocation reads every
    /// source before writing any target, so the row shifts as a whole.
    pub fn chained_locations(&self) -> BTreeSet<Location> {
        let sources: BTreeSet<&Location> = self.pairs.iter().map(|pair| &pair.old).collect();
        self.pairs
            .iter()
            .filter(|pair| sources.contains(&pair.new))
            .map(|pair| pair.new.clone())
            .collect()
    }
}

impl<'a> IntoIterator for &'a DisplacementSet {
    type Item = &'a DisplacementPair;
    type IntoIter = std::collections::btree_set::Iter<'a, DisplacementPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn loc(x: i32, y: i32, z: i32) -> Location {
        Location::new("world", x, y, z)
    }

    #[test]
    fn pair_rejects_identical_locations() {
        let err = DisplacementPair::new(loc(1, 1, 1), loc(1, 1, 1)).unwrap_err();
        assert_eq!(err, DisplacementError::SameLocation { location: loc(1, 1, 1) });
    }

    #[test]
    fn set_drops_exact_duplicates() {
        let pair = DisplacementPair::new(loc(0, 0, 0), loc(0, 0, 1)).unwrap();
        let set = DisplacementSet::new([pair.clone(), pair]).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn set_rejects_shared_target() {
        let a = DisplacementPair::new(loc(0, 0, 0), loc(5, 5, 5)).unwrap();
        let b = DisplacementPair::new(loc(1, 0, 0), loc(5, 5, 5)).unwrap();
        assert_eq!(
            DisplacementSet::new([a, b]).unwrap_err(),
            DisplacementError::ConflictingTarget { location: loc(5, 5, 5) }
        );
    }

    #[test]
    fn set_rejects_shared_source() {
        let a = DisplacementPair::new(loc(0, 0, 0), loc(0, 0, 1)).unwrap();
        let b = DisplacementPair::new(loc(0, 0, 0), loc(0, 1, 0)).unwrap();
        assert_eq!(
            DisplacementSet::new([a, b]).unwrap_err(),
            DisplacementError::ConflictingSource { location: loc(0, 0, 0) }
        );
    }

    #[test]
    fn flatten_collects_old_and_new() {
        let set =
            DisplacementSet::from_blocks([loc(0, 0, 0), loc(3, 0, 0)], Direction::UP).unwrap();
        let flat = set.flatten();
        assert_eq!(flat.len(), 4);
        assert!(flat.contains(&loc(0, 1, 0)));
        assert!(flat.contains(&loc(3, 0, 0)));
    }

    #[test]
    fn pushed_row_is_chained() {
        let set =
            DisplacementSet::from_blocks([loc(0, 0, 0), loc(0, 0, 1)], Direction::SOUTH).unwrap();
        assert_eq!(set.flatten().len(), 3);
        assert_eq!(set.chained_locations().into_iter().collect::<Vec<_>>(), vec![loc(0, 0, 1)]);
    }

    #[test]
    fn zero_direction_fails_fast() {
        let err =
            DisplacementSet::from_blocks([loc(0, 0, 0)], Direction::new(0, 0, 0)).unwrap_err();
        assert!(matches!(err, DisplacementError::SameLocation { .. }));
    }

    #[test]
    fn overflowing_direction_fails_fast() {
        let err = DisplacementSet::from_blocks([Location::new("w", 0, i32::MAX, 0)], Direction::UP)
            .unwrap_err();
        assert!(matches!(err, DisplacementError::CoordinateOverflow { .. }));
    }
}
