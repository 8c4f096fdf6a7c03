//! The tag entity.
//!
//! A tag marks a location whose block was placed (or broken, for the reverse
//! exploit) by a player, so that a later reward for the same location can be
//! suppressed. Tags are never edited: a new tag at the same location replaces
//! the old one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::TagId;
use crate::location::Location;

/// A location-keyed marker suppressing reward actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Record identity.
    id: TagId,
    /// When the tag was first created.
    created_at: DateTime<Utc>,
    /// Whether the tag expires after the ephemeral window.
    ephemeral: bool,
    /// The tagged location.
    location: Location,
}

impl Tag {
    /// Create a new tag with a fresh identifier.
    pub fn new(location: Location, ephemeral: bool, created_at: DateTime<Utc>) -> Self {
        Self {
            id: TagId::new(),
            created_at,
            ephemeral,
            location,
        }
    }

    /// Rebuild a tag from stored parts.
    pub const fn from_parts(
        id: TagId,
        created_at: DateTime<Utc>,
        ephemeral: bool,
        location: Location,
    ) -> Self {
        Self {
            id,
            created_at,
            ephemeral,
            location,
        }
    }

    /// Return the tag identifier.
    pub const fn id(&self) -> TagId {
        self.id
    }

    /// Return the creation instant.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the tag is ephemeral.
    pub const fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// Return the tagged location.
    pub const fn location(&self) -> &Location {
        &self.location
    }

    /// Build the tag that replaces this one after its block moved to `to`.
    ///
    /// The replacement gets a fresh identifier but keeps the creation instant
    /// and ephemerality, so moving a block never extends an ephemeral window.
    pub fn relocated(&self, to: Location) -> Self {
        Self {
            id: TagId::new(),
            created_at: self.created_at,
            ephemeral: self.ephemeral,
            location: to,
        }
    }

    /// Whether two tags carry the same information, ignoring identity.
    pub fn same_marking(&self, other: &Self) -> bool {
        self.location == other.location
            && self.ephemeral == other.ephemeral
            && self.created_at == other.created_at
    }
}
