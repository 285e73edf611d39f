// Open-loop move that ends once a mechanism has been held at its limit
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

use crate::io::Actuator;
use crate::setpoint::Setpoint;
use crate::settle::SettleTimer;
use crate::task::{Task, TaskState};
use crate::time::InstantLike;

/// Drives an actuator at a supplied speed until [`Actuator::can_move`] has refused that speed
/// without interruption for `wait_time`.
///
/// Useful for homing against a limit switch: the switch may bounce when first reached, and the
/// wait filters that out. An actuator without limits keeps this task running until cancelled.
#[derive(Debug)]
pub struct MoveUntilLimitHeld<I: InstantLike, A: Actuator> {
    actuator: A,
    speed: Setpoint,
    wait_time: Duration,
    at_limit: Option<SettleTimer<I>>,
    state: TaskState,
}

impl<I: InstantLike, A: Actuator> MoveUntilLimitHeld<I, A> {
    /// Drives `actuator` at `speed` until the limit has been held for `wait_time`.
    pub fn new(actuator: A, speed: impl Into<Setpoint>, wait_time: Duration) -> Self {
        Self {
            actuator,
            speed: speed.into(),
            wait_time,
            at_limit: None,
            state: TaskState::Idle,
        }
    }

    /// The driven actuator.
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Changes how long the limit must be held. A running task uses it from the next check on.
    pub fn set_wait_time(&mut self, wait_time: Duration) {
        self.wait_time = wait_time;
    }

    fn finish(&mut self, state: TaskState) {
        if self.state.is_running() {
            self.actuator.stop();
            self.state = state;
            log::debug!("limit move {:?}", state);
        }
    }
}

impl<I: InstantLike, A: Actuator> Task<I> for MoveUntilLimitHeld<I, A> {
    fn on_start(&mut self, now: I) {
        self.at_limit = Some(SettleTimer::new(now));
        self.state = TaskState::Running;
    }

    fn on_tick(&mut self, now: I) {
        if !self.state.is_running() {
            return;
        }
        let speed = self.speed.get();
        let can_move = self.actuator.can_move(speed);
        if can_move {
            self.actuator.write(speed);
        } else {
            self.actuator.stop();
        }
        if let Some(at_limit) = self.at_limit.as_mut() {
            at_limit.update(!can_move, now);
        }
    }

    fn is_finished(&mut self, now: I) -> bool {
        if !self.state.is_running() {
            return matches!(self.state, TaskState::Done | TaskState::Cancelled);
        }
        self.at_limit
            .map_or(false, |at_limit| at_limit.is_settled(self.wait_time, now))
    }

    fn on_end(&mut self) {
        self.finish(TaskState::Done);
    }

    fn on_cancel(&mut self) {
        self.finish(TaskState::Cancelled);
    }

    fn state(&self) -> TaskState {
        self.state
    }
}
