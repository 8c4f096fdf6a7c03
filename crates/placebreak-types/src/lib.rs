//! Shared value types for the place-and-break patch.
//!
//! Everything here is an immutable value: locations, tags, action types and
//! displacement batches. Persistence lives in `placebreak-store`, decisions
//! in `placebreak-core`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for tag identifiers
//! - [`location`] -- Block locations, directions and blocks
//! - [`tag`] -- The location-keyed tag entity
//! - [`action`] -- Job action types reported by the host
//! - [`displacement`] -- Validated batches of moved blocks

pub mod action;
pub mod displacement;
pub mod ids;
pub mod location;
pub mod tag;

// Re-export all public types at crate root for convenience.
pub use action::{ActionType, UnknownActionType};
pub use displacement::{DisplacementError, DisplacementPair, DisplacementSet};
pub use ids::TagId;
pub use location::{Block, Direction, Location};
pub use tag::Tag;
