//! `timeval` difference arithmetic.
//!
//! Differences are computed in signed 64-bit microseconds and split with
//! truncating division, so both fields carry the sign of the difference:
//!
//! - `diff >= 0`: `secs >= 0`, `micros` in `[0, 1_000_000)`
//! - `diff < 0`: `secs <= 0`, `micros` in `(-1_000_000, 0]`
//!
//! [`TimeDelta::as_millis`] truncates toward zero as well.

/// Microseconds per second.
pub const MICROS_PER_SEC: i64 = 1_000_000;

/// A signed `(seconds, microseconds)` difference between two timestamps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TimeDelta {
    /// Whole seconds.
    pub secs: i64,
    /// Microsecond remainder, same sign as `secs` (or the total if `secs == 0`).
    pub micros: i64,
}

impl TimeDelta {
    /// Split a microsecond total into seconds and remainder.
    pub const fn from_micros(total: i64) -> Self {
        Self {
            secs: total / MICROS_PER_SEC,
            micros: total % MICROS_PER_SEC,
        }
    }

    /// `later - earlier`, each given as `(seconds, microseconds)`.
    ///
    /// Inputs need not be normalized. Wraps instead of panicking on
    /// overflow, which takes timestamps about 292 000 years apart.
    pub const fn between(later: (i64, i64), earlier: (i64, i64)) -> Self {
        let later_us = later.1.wrapping_add(later.0.wrapping_mul(MICROS_PER_SEC));
        let earlier_us = earlier.1.wrapping_add(earlier.0.wrapping_mul(MICROS_PER_SEC));
        Self::from_micros(later_us.wrapping_sub(earlier_us))
    }

    /// Whole milliseconds, sub-millisecond remainder truncated toward zero.
    pub const fn as_millis(self) -> i64 {
        self.secs * 1000 + self.micros / 1000
    }
}
