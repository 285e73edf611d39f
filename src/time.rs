// Time-like objects, clocks, and helpers for measuring settle windows and timeouts
// Copyright © 2025 Hs293Go
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included
// in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES
// OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
// IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
// TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE
// OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use core::cell::Cell;
use core::fmt::Debug;
use core::ops::Add;
use core::time::Duration;

/// A trait for monotonic time-like objects.
///
/// Tasks receive the current instant from the scheduler on every callback and use this trait to
/// measure how long the loop has been on target and how long the task has been running.
pub trait InstantLike: Sized + Add<Duration, Output = Self> + Clone + Copy + Debug + PartialEq {
    /// Returns the amount of time elapsed from another instant to this one, saturating at zero
    /// if `earlier` is actually later.
    #[must_use]
    fn duration_since(&self, earlier: Self) -> Duration;
}

/// Milliseconds since an arbitrary epoch, e.g. the FPGA timestamp of a robot controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Millis(pub u64);

impl InstantLike for Millis {
    fn duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Millis {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Millis(self.0 + rhs.as_millis() as u64)
    }
}

/// Seconds since an arbitrary epoch, stored as a float
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeF64(pub f64);

impl InstantLike for TimeF64 {
    fn duration_since(&self, earlier: Self) -> Duration {
        let secs = self.0 - earlier.0;
        if secs <= 0.0 || secs.is_nan() {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        }
    }
}

impl Add<Duration> for TimeF64 {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        TimeF64(self.0 + rhs.as_secs_f64())
    }
}

impl TimeF64 {
    /// Constructs a new TimeF64 from raw seconds.
    pub fn from_secs(secs: f64) -> Self {
        TimeF64(secs)
    }

    /// Returns the underlying seconds.
    pub fn as_secs_f64(&self) -> f64 {
        self.0
    }
}

/// A source of the current instant.
pub trait Clock<I: InstantLike> {
    /// Returns the current instant. Successive calls never go backwards.
    fn now(&self) -> I;
}

/// A clock that only moves when told to. Handy for driving tasks at a fixed period in tests and
/// simulations.
#[derive(Debug)]
pub struct ManualClock<I: InstantLike> {
    now: Cell<I>,
}

impl<I: InstantLike> ManualClock<I> {
    /// Creates a clock frozen at `start`.
    pub fn new(start: I) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Moves the clock forward by `step` and returns the new instant.
    pub fn advance(&self, step: Duration) -> I {
        let next = self.now.get() + step;
        self.now.set(next);
        next
    }
}

impl<I: InstantLike> Clock<I> for ManualClock<I> {
    fn now(&self) -> I {
        self.now.get()
    }
}

/// Returns true once at least `limit` has elapsed between `start` and `now`.
pub(crate) fn has_elapsed<I: InstantLike>(start: I, now: I, limit: Duration) -> bool {
    now.duration_since(start) >= limit
}

/// A convenient wrapper around `std::time::Instant` satisfying the `InstantLike` trait.
#[cfg(feature = "std")]
mod std_instant {

    use super::{Add, Clock, Duration, InstantLike};

    /// A `std::time::Instant` usable as an [`InstantLike`].
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct StdInstant(pub std::time::Instant);

    impl StdInstant {
        /// The current instant.
        pub fn now() -> Self {
            StdInstant(std::time::Instant::now())
        }
    }

    impl InstantLike for StdInstant {
        fn duration_since(&self, other: Self) -> Duration {
            self.0.saturating_duration_since(other.0)
        }
    }

    impl Add<Duration> for StdInstant {
        type Output = Self;

        fn add(self, rhs: Duration) -> Self::Output {
            StdInstant(self.0 + rhs)
        }
    }

    /// The wall clock of the host, backed by `std::time::Instant`
    #[derive(Debug, Default, Clone, Copy)]
    pub struct StdClock;

    impl Clock<StdInstant> for StdClock {
        fn now(&self) -> StdInstant {
            StdInstant::now()
        }
    }

    #[cfg(test)]
    #[test]
    fn test_std_instant_saturates_backwards() {
        let start = StdInstant::now();
        let end = StdClock.now();
        assert_eq!(start.duration_since(end), Duration::ZERO);
        assert_eq!(end.duration_since(start), end.0.duration_since(start.0));
    }
}

#[cfg(feature = "std")]
pub use std_instant::{StdClock, StdInstant};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances_only_when_told() {
        let clock = ManualClock::new(Millis(100));
        assert_eq!(clock.now(), Millis(100));
        assert_eq!(clock.advance(Duration::from_millis(20)), Millis(120));
        assert_eq!(clock.now(), Millis(120));
    }

    #[test]
    fn test_duration_since_saturates() {
        assert_eq!(Millis(5).duration_since(Millis(10)), Duration::ZERO);
        assert_eq!(TimeF64(1.0).duration_since(TimeF64(2.0)), Duration::ZERO);
        assert_eq!(TimeF64(1.0).duration_since(TimeF64(f64::NAN)), Duration::ZERO);
        assert_eq!(
            TimeF64(f64::INFINITY).duration_since(TimeF64(0.0)),
            Duration::MAX
        );
        assert_eq!(TimeF64(1e300).duration_since(TimeF64(0.0)), Duration::MAX);
        assert!(has_elapsed(Millis(0), Millis(2000), Duration::from_secs(2)));
        assert!(!has_elapsed(Millis(0), Millis(1999), Duration::from_secs(2)));
    }
}
