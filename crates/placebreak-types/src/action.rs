//! Job action types reported by the host's reward plugin.

use serde::{Deserialize, Serialize};

/// An action that may earn a job reward.
///
/// Only block-related actions can be disguised repeats of a placement, see
/// [`ActionType::is_patchable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// A block was broken by hand or tool.
    Break,
    /// A block was destroyed by TNT.
    TntBreak,
    /// A block was placed.
    Place,
    /// A block was stripped (e.g. logs).
    Strip,
    /// A player was killed.
    Kill,
    /// A mob was killed.
    MobKill,
    /// A fish was caught.
    Fish,
    /// An item was crafted.
    Craft,
    /// An item was smelted.
    Smelt,
    /// A potion was brewed.
    Brew,
    /// An item was enchanted.
    Enchant,
    /// An item was repaired.
    Repair,
    /// Animals were bred.
    Breed,
    /// An animal was tamed.
    Tame,
    /// An entity was dyed.
    Dye,
    /// A sheep was sheared.
    Shear,
    /// A cow was milked.
    Milk,
    /// A chunk was explored.
    Explore,
    /// An item was eaten.
    Eat,
}

impl ActionType {
    /// Every action type, in declaration order.
    pub const ALL: [Self; 19] = [
        Self::Break,
        Self::TntBreak,
        Self::Place,
        Self::Strip,
        Self::Kill,
        Self::MobKill,
        Self::Fish,
        Self::Craft,
        Self::Smelt,
        Self::Brew,
        Self::Enchant,
        Self::Repair,
        Self::Breed,
        Self::Tame,
        Self::Dye,
        Self::Shear,
        Self::Milk,
        Self::Explore,
        Self::Eat,
    ];

    /// Whether a tag can turn this action into an exploit.
    pub const fn is_patchable(self) -> bool {
        matches!(self, Self::Break | Self::TntBreak | Self::Place)
    }

    /// The host-facing upper-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Break => "BREAK",
            Self::TntBreak => "TNT_BREAK",
            Self::Place => "PLACE",
            Self::Strip => "STRIP",
            Self::Kill => "KILL",
            Self::MobKill => "MOB_KILL",
            Self::Fish => "FISH",
            Self::Craft => "CRAFT",
            Self::Smelt => "SMELT",
            Self::Brew => "BREW",
            Self::Enchant => "ENCHANT",
            Self::Repair => "REPAIR",
            Self::Breed => "BREED",
            Self::Tame => "TAME",
            Self::Dye => "DYE",
            Self::Shear => "SHEAR",
            Self::Milk => "MILK",
            Self::Explore => "EXPLORE",
            Self::Eat => "EAT",
        }
    }
}

impl core::fmt::Display for ActionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown action name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action type: {0}")]
pub struct UnknownActionType(pub String);

impl core::str::FromStr for ActionType {
    type Err = UnknownActionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == wanted)
            .ok_or_else(|| UnknownActionType(s.to_owned()))
    }
}
