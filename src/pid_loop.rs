// A PID controller wired between a feedback source and an output stage
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

use num_traits::float::FloatCore;

use crate::io::FeedbackSource;
use crate::output::OutputStage;
use crate::pid::{PidConfig, PidController};
use crate::time::InstantLike;

/// A PID loop reading a [`FeedbackSource`] and driving an [`OutputStage`].
///
/// The loop owns its source and output stage for the lifetime of the task; the PID controller
/// itself only exists between `enable` and `disable`.
///
/// With an input range set, the feedback is treated as continuous (a gyro wrapping at 360) and
/// the error is taken the short way round, within `[-range / 2, range / 2]`.
#[derive(Debug)]
pub struct SettlingPidLoop<I: InstantLike, S: FeedbackSource, O: OutputStage> {
    source: S,
    output: O,
    controller: Option<PidController<I>>,
    input_range: Option<f64>,
    error: f64,
    setpoint_pushes: usize,
}

impl<I: InstantLike, S: FeedbackSource, O: OutputStage> SettlingPidLoop<I, S, O> {
    /// Creates a disabled loop with a non-continuous input.
    pub fn new(source: S, output: O) -> Self {
        Self {
            source,
            output,
            controller: None,
            input_range: None,
            error: f64::NAN,
            setpoint_pushes: 0,
        }
    }

    /// Treats the feedback as wrapping around every `range` units; `None` for a plain input.
    pub fn set_input_range(&mut self, range: Option<f64>) {
        self.input_range = range;
    }

    /// The wrap-around range of the input, if continuous.
    pub fn input_range(&self) -> Option<f64> {
        self.input_range
    }

    /// Mutable access to the feedback source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The output stage.
    pub fn output_stage(&self) -> &O {
        &self.output
    }

    /// Mutable access to the output stage.
    pub fn output_stage_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Replaces any previous controller with a fresh one aimed at `setpoint`.
    pub fn enable(&mut self, config: PidConfig, setpoint: f64) {
        let mut controller = PidController::new(config);
        controller.set_setpoint(setpoint);
        controller.enable();
        self.controller = Some(controller);
        self.error = f64::NAN;
        self.setpoint_pushes = 0;
    }

    /// Drops the controller and puts the output stage in neutral. Does nothing if the loop is
    /// already disabled.
    pub fn disable(&mut self) {
        if self.controller.take().is_some() {
            self.output.neutral();
        }
    }

    /// True while a controller exists.
    pub fn is_enabled(&self) -> bool {
        self.controller.is_some()
    }

    /// The controller of the current run, if any.
    pub fn controller(&self) -> Option<&PidController<I>> {
        self.controller.as_ref()
    }

    /// The setpoint of the current run, if any.
    pub fn setpoint(&self) -> Option<f64> {
        self.controller.as_ref().map(PidController::setpoint)
    }

    /// Pushes `setpoint` into the controller only if it differs from the current one. Returns
    /// whether a push happened.
    pub fn update_setpoint(&mut self, setpoint: f64) -> bool {
        match self.controller.as_mut() {
            Some(controller) if controller.setpoint() != setpoint => {
                log::trace!("setpoint {} -> {}", controller.setpoint(), setpoint);
                controller.set_setpoint(setpoint);
                self.setpoint_pushes += 1;
                true
            }
            _ => false,
        }
    }

    /// Diagnostic: number of setpoint changes pushed since the loop was last enabled.
    pub fn setpoint_pushes(&self) -> usize {
        self.setpoint_pushes
    }

    /// Reads the feedback, runs the controller and applies its output.
    ///
    /// The error is refreshed on every call, but the output stage only sees the controller's
    /// output on ticks where it took a new sample. Returns that output, or `None` while disabled
    /// or between samples.
    pub fn step(&mut self, now: I) -> Option<f64> {
        let controller = self.controller.as_mut()?;
        let input = self.source.read();
        let setpoint = controller.setpoint();
        self.error = match self.input_range {
            Some(range) => wrap_error(setpoint - input, range),
            None => setpoint - input,
        };
        // Feed the controller the input that yields the wrapped error
        let output = controller.try_compute(setpoint - self.error, now)?;
        self.output.apply(output);
        Some(output)
    }

    /// Error of the latest step; NaN before the first step of a run.
    pub fn error(&self) -> f64 {
        self.error
    }

    /// True when the error of the latest step is within `tolerance`.
    pub fn on_target(&self, tolerance: f64) -> bool {
        self.error.abs() <= tolerance
    }
}

/// Wraps `error` into `[-range / 2, range / 2]`.
fn wrap_error(error: f64, range: f64) -> f64 {
    let half = range / 2.0;
    let wrapped = error % range;
    if wrapped > half {
        wrapped - range
    } else if wrapped < -half {
        wrapped + range
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_error_takes_short_way() {
        assert_eq!(wrap_error(340.0, 360.0), -20.0);
        assert_eq!(wrap_error(-340.0, 360.0), 20.0);
        assert_eq!(wrap_error(90.0, 360.0), 90.0);
        assert_eq!(wrap_error(720.0 + 10.0, 360.0), 10.0);
        assert_eq!(wrap_error(180.0, 360.0), 180.0);
    }
}
