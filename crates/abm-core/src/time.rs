//! Simulation time model.
//!
//! # Design
//!
//! Time is a continuous `f64` extended with `+∞`: an empty calendar reports
//! `Time::NEVER` as the time of its (non-existent) earliest event, so "no
//! pending work" and "work at +∞" are the same thing and the run loop needs
//! no special case for empty queues.
//!
//! `Time` is totally ordered via `f64::total_cmp` so it can be used directly
//! as an ordered-map key.  Times are never NaN — constructors debug-assert
//! it, and all engine arithmetic preserves it.

use std::fmt;
use std::ops::Add;

/// An absolute simulation time, extended with `+∞`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time(pub f64);

impl Time {
    pub const ZERO: Time = Time(0.0);

    /// The time of an event that will never fire (an empty calendar's key).
    pub const NEVER: Time = Time(f64::INFINITY);

    /// Construct from a raw `f64`.
    ///
    /// # Panics
    /// Panics in debug mode if `t` is NaN.
    #[inline]
    pub fn new(t: f64) -> Time {
        debug_assert!(!t.is_nan(), "simulation time must not be NaN");
        Time(t)
    }

    /// `true` if this is `NEVER` (+∞).
    #[inline]
    pub fn is_never(self) -> bool {
        self.0 == f64::INFINITY
    }

    /// The earlier of two times.
    #[inline]
    pub fn min(self, other: Time) -> Time {
        if other < self { other } else { self }
    }
}

impl Eq for Time {}

impl Ord for Time {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for Time {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl From<f64> for Time {
    #[inline]
    fn from(t: f64) -> Time {
        Time::new(t)
    }
}

impl Add<f64> for Time {
    type Output = Time;
    /// Offset by a delay.  `∞ + d = ∞`; a finite time plus an infinite delay
    /// is `NEVER`.
    #[inline]
    fn add(self, delay: f64) -> Time {
        Time::new(self.0 + delay)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            write!(f, "t=never")
        } else {
            write!(f, "t={}", self.0)
        }
    }
}
