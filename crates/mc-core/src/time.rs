//! Virtual time model.
//!
//! # Design
//!
//! Time is a monotonically non-decreasing millisecond counter.  The travel
//! model works in minutes rounded to two decimals (0.01 min = 600 ms), so
//! every duration it produces is an exact integer number of milliseconds and
//! event ordering never suffers floating-point drift.
//!
//! `SimTime` is an absolute instant, `SimDuration` a span.  Only
//! `SimTime + SimDuration` and `SimTime - SimTime` are defined, which keeps
//! the two from being mixed up at call sites.

use std::fmt;

const MILLIS_PER_MINUTE: f64 = 60_000.0;

// ── SimDuration ───────────────────────────────────────────────────────────────

/// A span of virtual time in milliseconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimDuration(pub u64);

impl SimDuration {
    pub const ZERO: SimDuration = SimDuration(0);

    #[inline]
    pub fn from_millis(ms: u64) -> Self {
        SimDuration(ms)
    }

    #[inline]
    pub fn from_secs(secs: u64) -> Self {
        SimDuration(secs * 1_000)
    }

    /// Convert fractional minutes, rounding to the nearest millisecond.
    /// Negative and non-finite inputs clamp to zero.
    #[inline]
    pub fn from_minutes(minutes: f64) -> Self {
        if !minutes.is_finite() || minutes <= 0.0 {
            return SimDuration::ZERO;
        }
        SimDuration((minutes * MILLIS_PER_MINUTE).round() as u64)
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_minutes(self) -> f64 {
        self.0 as f64 / MILLIS_PER_MINUTE
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn saturating_sub(self, rhs: SimDuration) -> SimDuration {
        SimDuration(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::Add for SimDuration {
    type Output = SimDuration;
    #[inline]
    fn add(self, rhs: SimDuration) -> SimDuration {
        SimDuration(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for SimDuration {
    #[inline]
    fn add_assign(&mut self, rhs: SimDuration) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for SimDuration {
    fn sum<I: Iterator<Item = SimDuration>>(iter: I) -> SimDuration {
        iter.fold(SimDuration::ZERO, |a, b| a + b)
    }
}

impl fmt::Display for SimDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}min", self.as_minutes())
    }
}

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute virtual instant, in milliseconds since the start of the run.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// The instant `minutes` after the start of the run.
    #[inline]
    pub fn from_minutes(minutes: f64) -> Self {
        SimTime(SimDuration::from_minutes(minutes).0)
    }

    #[inline]
    pub fn as_minutes(self) -> f64 {
        self.0 as f64 / MILLIS_PER_MINUTE
    }

    /// Span elapsed from `earlier` to `self`; zero if `earlier` is later.
    #[inline]
    pub fn since(self, earlier: SimTime) -> SimDuration {
        SimDuration(self.0.saturating_sub(earlier.0))
    }
}

impl std::ops::Add<SimDuration> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: SimDuration) -> SimTime {
        SimTime(self.0 + rhs.0)
    }
}

impl std::ops::Sub for SimTime {
    type Output = SimDuration;
    /// # Panics
    /// Panics in debug mode if `rhs > self`.
    #[inline]
    fn sub(self, rhs: SimTime) -> SimDuration {
        SimDuration(self.0 - rhs.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:.2}", self.as_minutes())
    }
}

/// Round `minutes` to two decimals, the precision the travel model reports.
#[inline]
pub fn round2(minutes: f64) -> f64 {
    (minutes * 100.0).round() / 100.0
}
