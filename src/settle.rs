// Debounce of the on-target signal of a control loop
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

use core::time::Duration;

use crate::time::{has_elapsed, InstantLike};

/// Remembers the last instant a loop was *not* on target.
///
/// A loop is settled once the most recent sample was on target and the last miss lies at least
/// `wait_time` in the past. The miss instant starts at the reset time rather than at minus
/// infinity, so a loop that is on target from the very first tick still waits one full window.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SettleTimer<I: InstantLike> {
    last_time_not_on_target: I,
    on_target: bool,
}

impl<I: InstantLike> SettleTimer<I> {
    /// Starts a fresh window at `now`.
    pub fn new(now: I) -> Self {
        Self {
            last_time_not_on_target: now,
            on_target: true,
        }
    }

    /// Restarts the window at `now`.
    pub fn reset(&mut self, now: I) {
        *self = Self::new(now);
    }

    /// Feeds the on-target status observed at `now`.
    pub fn update(&mut self, on_target: bool, now: I) {
        if !on_target {
            self.last_time_not_on_target = now;
        }
        self.on_target = on_target;
    }

    /// True when the latest sample was on target and the last miss is at least `wait_time` old.
    pub fn is_settled(&self, wait_time: Duration, now: I) -> bool {
        self.on_target && has_elapsed(self.last_time_not_on_target, now, wait_time)
    }

    /// The last instant the loop was off target, or the reset time.
    pub fn last_time_not_on_target(&self) -> I {
        self.last_time_not_on_target
    }

    /// How long the loop has been on target without interruption.
    pub fn time_on_target(&self, now: I) -> Duration {
        if self.on_target {
            now.duration_since(self.last_time_not_on_target)
        } else {
            Duration::ZERO
        }
    }
}
