//! Material-based restrictions on tagging.
//!
//! Server operators can exclude materials from the patch (blacklist) or
//! limit it to a few (whitelist). A restricted block is never tagged, never
//! carries a tag when moved, and never counts as an exploit.

use std::collections::BTreeSet;

use serde::Deserialize;

/// How the material list is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestrictionMode {
    /// Nothing is restricted.
    #[default]
    Disabled,
    /// Listed materials are restricted.
    Blacklist,
    /// Every material except the listed ones is restricted.
    Whitelist,
}

/// The restriction mode and its material list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RestrictedBlocks {
    /// How `materials` is applied.
    #[serde(default)]
    pub mode: RestrictionMode,

    /// Material names, matched exactly (e.g. `STONE`, `OAK_LOG`).
    #[serde(default)]
    pub materials: BTreeSet<String>,
}

impl RestrictedBlocks {
    /// Create restrictions from a mode and material names.
    pub fn new<I, S>(mode: RestrictionMode, materials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode,
            materials: materials.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether blocks of `material` are excluded from the patch.
    pub fn is_restricted(&self, material: &str) -> bool {
        match self.mode {
            RestrictionMode::Disabled => false,
            RestrictionMode::Blacklist => self.materials.contains(material),
            RestrictionMode::Whitelist => !self.materials.contains(material),
        }
    }
}
