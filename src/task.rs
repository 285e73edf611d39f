// The contract between a cooperative scheduler and the tasks it runs
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

use crate::time::InstantLike;

/// Lifecycle of a task. `Done` and `Cancelled` are terminal for one run; a task may be started
/// again afterwards.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TaskState {
    /// Not started yet
    #[default]
    Idle,
    /// Started and not yet finished
    Running,
    /// Finished on its own
    Done,
    /// Interrupted by the scheduler
    Cancelled,
}

impl TaskState {
    /// True between start and end or cancel.
    pub fn is_running(&self) -> bool {
        *self == TaskState::Running
    }
}

/// A unit of work driven by a fixed-period cooperative scheduler.
///
/// The scheduler calls `on_start` once, then `on_tick` followed by `is_finished` every period,
/// and finally exactly one of `on_end` (natural completion) or `on_cancel` (interruption). None
/// of these may block.
pub trait Task<I: InstantLike> {
    /// Called once when the scheduler starts the task.
    fn on_start(&mut self, now: I);

    /// Called every period while running.
    fn on_tick(&mut self, now: I);

    /// Polled after every tick; true once the task is done.
    fn is_finished(&mut self, now: I) -> bool;

    /// Called once after `is_finished` returned true. Puts the mechanism in neutral.
    fn on_end(&mut self);

    /// Called once if the scheduler interrupts the task. Same cleanup as `on_end`.
    fn on_cancel(&mut self);

    /// Where the task is in its lifecycle.
    fn state(&self) -> TaskState;

    /// One scheduler period: tick, check for completion, and end the task if it completed.
    /// Returns whether the task finished during this period.
    fn run_tick(&mut self, now: I) -> bool {
        self.on_tick(now);
        let finished = self.is_finished(now);
        if finished {
            self.on_end();
        }
        finished
    }
}
