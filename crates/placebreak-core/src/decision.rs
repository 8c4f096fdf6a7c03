//! The exploit decision rule.
//!
//! Given an action, the tag found at its location (if any), and the current
//! instant, decide whether the action's reward should be suppressed. Checks
//! run in a fixed order and the first conclusive one wins:
//!
//! 1. Only `BREAK`, `TNT_BREAK` and `PLACE` are eligible.
//! 2. No tag means no exploit.
//! 3. A persistent tag is always an exploit.
//! 4. An ephemeral tag is an exploit while its age is below the window.
//!
//! The rule is pure. It never reads the store or the clock itself; the
//! service does that and passes the results in.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use placebreak_types::{ActionType, Tag};

/// How long an ephemeral tag suppresses rewards.
pub const DEFAULT_EPHEMERAL_WINDOW: Duration = Duration::from_secs(3);

/// The outcome of evaluating one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The action type is never patched.
    Ineligible,
    /// The location carries no tag.
    Untagged,
    /// The location carries a persistent tag.
    Persistent,
    /// The location carries an ephemeral tag still inside the window.
    Fresh {
        /// Age of the tag.
        elapsed: TimeDelta,
    },
    /// The location carries an ephemeral tag whose window has passed.
    Expired {
        /// Age of the tag.
        elapsed: TimeDelta,
    },
}

impl Verdict {
    /// Whether the reward should be suppressed.
    pub const fn is_exploit(self) -> bool {
        matches!(self, Self::Persistent | Self::Fresh { .. })
    }
}

/// Applies the decision rule with a fixed ephemeral window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExploitDecider {
    window: TimeDelta,
}

impl ExploitDecider {
    /// Create a decider with the given ephemeral window.
    ///
    /// Windows too large for a [`TimeDelta`] saturate, which makes every
    /// ephemeral tag behave as persistent.
    pub fn new(window: Duration) -> Self {
        Self {
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Return the ephemeral window.
    pub const fn window(&self) -> TimeDelta {
        self.window
    }

    /// Evaluate `action` against the tag found at its location.
    ///
    /// A tag created after `now` (clock skew between hosts) has a negative
    /// age and therefore counts as fresh.
    pub fn evaluate(&self, action: ActionType, tag: Option<&Tag>, now: DateTime<Utc>) -> Verdict {
        if !action.is_patchable() {
            return Verdict::Ineligible;
        }
        let Some(tag) = tag else {
            return Verdict::Untagged;
        };
        if !tag.is_ephemeral() {
            return Verdict::Persistent;
        }

        let elapsed = now.signed_duration_since(tag.created_at());
        if elapsed < self.window {
            Verdict::Fresh { elapsed }
        } else {
            Verdict::Expired { elapsed }
        }
    }
}

impl Default for ExploitDecider {
    fn default() -> Self {
        Self::new(DEFAULT_EPHEMERAL_WINDOW)
    }
}
