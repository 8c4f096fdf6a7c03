//! Time source for the decision engine.
//!
//! The ephemeral window is measured against an injected [`Clock`] rather than
//! read from the system directly, so tests can pin "now" to an exact instant
//! and step it forward deterministically.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Advancing would leave the representable date range.
    #[error("clock overflow: cannot advance {from} by {delta}")]
    Overflow {
        /// Instant before the failed advance.
        from: DateTime<Utc>,
        /// Requested step.
        delta: TimeDelta,
    },
}

/// A source of the current instant.
pub trait Clock: Send + Sync + core::fmt::Debug {
    /// Return the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jump to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }

    /// Step forward (or back, for a negative delta) and return the new instant.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Overflow`] if the result is out of range.
    pub fn advance(&self, delta: TimeDelta) -> Result<DateTime<Utc>, ClockError> {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        let next = now
            .checked_add_signed(delta)
            .ok_or(ClockError::Overflow { from: *now, delta })?;
        *now = next;
        Ok(next)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn manual_clock_holds_still() {
        let clock = ManualClock::new(start());
        assert_eq!(clock.now(), start());
        assert_eq!(clock.now(), start());
    }

    #[test]
    fn manual_clock_advances_and_sets() {
        let clock = ManualClock::new(start());
        let next = clock.advance(TimeDelta::seconds(4)).unwrap();
        assert_eq!(next, start() + TimeDelta::seconds(4));
        assert_eq!(clock.now(), next);

        clock.set(start());
        assert_eq!(clock.now(), start());
    }

    #[test]
    fn advance_past_max_is_overflow() {
        let clock = ManualClock::new(DateTime::<Utc>::MAX_UTC);
        let err = clock.advance(TimeDelta::seconds(1)).unwrap_err();
        assert!(matches!(err, ClockError::Overflow { .. }));
        assert_eq!(clock.now(), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
