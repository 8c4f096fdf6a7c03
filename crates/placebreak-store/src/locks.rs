//! Per-location write serialization for the SQL backends.
//!
//! The tag table has no uniqueness constraint on its location columns, so two
//! concurrent delete-then-insert transactions for the same location could both
//! insert. Writers therefore take a striped async mutex chosen by location
//! hash. A multi-location write takes every stripe it touches in ascending
//! index order, which rules out lock-order deadlocks.

use std::collections::BTreeSet;
use std::hash::{DefaultHasher, Hash, Hasher};

use placebreak_types::Location;
use tokio::sync::{Mutex, MutexGuard};

/// Number of stripes.
const STRIPES: u64 = 64;

/// A fixed set of mutexes covering every location.
#[derive(Debug)]
pub(crate) struct LocationLocks {
    stripes: Vec<Mutex<()>>,
}

/// Held stripes; released on drop.
#[derive(Debug)]
pub(crate) struct LocationGuard<'a> {
    _held: Vec<MutexGuard<'a, ()>>,
}

impl LocationLocks {
    pub(crate) fn new() -> Self {
        Self {
            stripes: (0..STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Lock every stripe covering `locations`.
    pub(crate) async fn lock<'l>(
        &self,
        locations: impl IntoIterator<Item = &'l Location>,
    ) -> LocationGuard<'_> {
        let wanted: BTreeSet<usize> = locations.into_iter().map(stripe_of).collect();

        let mut held = Vec::with_capacity(wanted.len());
        for (index, stripe) in self.stripes.iter().enumerate() {
            if wanted.contains(&index) {
                held.push(stripe.lock().await);
            }
        }
        LocationGuard { _held: held }
    }
}

impl Default for LocationLocks {
    fn default() -> Self {
        Self::new()
    }
}

fn stripe_of(location: &Location) -> usize {
    let mut hasher = DefaultHasher::new();
    location.hash(&mut hasher);
    let index = hasher.finish().checked_rem(STRIPES).unwrap_or(0);
    usize::try_from(index).unwrap_or(0)
}
