//! Block locations, movement directions, and blocks.
//!
//! A [`Location`] is the lookup key for tags: a world name plus integer block
//! coordinates. Equality is structural, so two locations built from the same
//! parts always address the same tag.

use serde::{Deserialize, Serialize};

/// The position of a single block within a named world.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Name of the world the block lives in.
    world: String,
    /// Block X coordinate.
    x: i32,
    /// Block Y coordinate.
    y: i32,
    /// Block Z coordinate.
    z: i32,
}

impl Location {
    /// Create a location from a world name and block coordinates.
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Return the world name.
    pub fn world(&self) -> &str {
        &self.world
    }

    /// Return the X coordinate.
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Return the Y coordinate.
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Return the Z coordinate.
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Return the location one step away in `direction`, in the same world.
    ///
    /// Returns `None` if any coordinate would overflow.
    pub fn offset(&self, direction: Direction) -> Option<Self> {
        Some(Self {
            world: self.world.clone(),
            x: self.x.checked_add(direction.dx)?,
            y: self.y.checked_add(direction.dy)?,
            z: self.z.checked_add(direction.dz)?,
        })
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}({}, {}, {})", self.world, self.x, self.y, self.z)
    }
}

/// A unit of block displacement, as applied by a piston push or pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Direction {
    /// Offset along the X axis.
    pub dx: i32,
    /// Offset along the Y axis.
    pub dy: i32,
    /// Offset along the Z axis.
    pub dz: i32,
}

impl Direction {
    /// Towards positive Y.
    pub const UP: Self = Self::new(0, 1, 0);
    /// Towards negative Y.
    pub const DOWN: Self = Self::new(0, -1, 0);
    /// Towards negative Z.
    pub const NORTH: Self = Self::new(0, 0, -1);
    /// Towards positive Z.
    pub const SOUTH: Self = Self::new(0, 0, 1);
    /// Towards positive X.
    pub const EAST: Self = Self::new(1, 0, 0);
    /// Towards negative X.
    pub const WEST: Self = Self::new(-1, 0, 0);

    /// Create a direction from per-axis offsets.
    pub const fn new(dx: i32, dy: i32, dz: i32) -> Self {
        Self { dx, dy, dz }
    }

    /// Whether this direction moves nothing.
    pub const fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0 && self.dz == 0
    }
}

/// A block as seen by the host: where it is and what it is made of.
///
/// The material is an opaque host identifier (e.g. `"STONE"`), only used to
/// match against restriction lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    /// Where the block is.
    pub location: Location,
    /// Host material name.
    pub material: String,
}

impl Block {
    /// Create a block.
    pub fn new(location: Location, material: impl Into<String>) -> Self {
        Self {
            location,
            material: material.into(),
        }
    }
}
