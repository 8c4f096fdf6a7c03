//! The tag repository contract.
//!
//! Every backend gives identical black-box behavior: at most one tag per
//! location, `put` replaces, `delete` of an absent location succeeds, and
//! `move_tags` carries tags with their blocks. Only durability and connection
//! setup differ.

use std::future::Future;

use placebreak_types::{DisplacementSet, Location, Tag};

use crate::error::StoreError;

/// Location-keyed tag persistence.
pub trait TagRepository: Send + Sync {
    /// Open backend resources. Repeated calls are no-ops.
    fn connect(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        async { Ok(()) }
    }

    /// Release backend resources. Repeated calls are no-ops.
    fn disconnect(&self) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Insert `tag`, replacing any tag already at its location.
    fn put(&self, tag: &Tag) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Return the tag at `location`, if any.
    fn find_by_location(
        &self,
        location: &Location,
    ) -> impl Future<Output = Result<Option<Tag>, StoreError>> + Send;

    /// Remove any tag at `location`. Absence is not an error.
    fn delete(&self, location: &Location) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Relocate tags along `displacements` as one unit and return how many
    /// tags were carried.
    fn move_tags(
        &self,
        displacements: &DisplacementSet,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;
}
