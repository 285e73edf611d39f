// Output stages: how a PID output reaches the mechanism
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

use crate::io::{Actuator, Drivetrain};
use crate::setpoint::Setpoint;

/// Applies the output of a PID loop to a mechanism.
pub trait OutputStage {
    /// Hands one fresh PID output to the mechanism.
    fn apply(&mut self, pid_output: f64);

    /// Commands the mechanism to its neutral state. Called once when a run ends or is cancelled.
    fn neutral(&mut self);
}

/// Writes the PID output straight to an actuator.
#[derive(Debug)]
pub struct DirectOutput<A: Actuator> {
    actuator: A,
}

impl<A: Actuator> DirectOutput<A> {
    /// Writes to `actuator`.
    pub fn new(actuator: A) -> Self {
        Self { actuator }
    }

    /// The driven actuator.
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Mutable access to the driven actuator.
    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }
}

impl<A: Actuator> OutputStage for DirectOutput<A> {
    fn apply(&mut self, pid_output: f64) {
        self.actuator.write(pid_output.clamp(-1.0, 1.0));
    }

    fn neutral(&mut self) {
        self.actuator.stop();
    }
}

/// Adds the scaled PID output to the actuator's current command, integrating the loop output.
///
/// With a rate feedback source this holds a speed while limiting how fast the command may
/// change per tick to `acceleration`.
#[derive(Debug)]
pub struct AccumulatingOutput<A: Actuator> {
    actuator: A,
    acceleration: f64,
}

impl<A: Actuator> AccumulatingOutput<A> {
    /// Adds `pid_output * acceleration` to the command of `actuator` on every sample.
    pub fn new(actuator: A, acceleration: f64) -> Self {
        Self {
            actuator,
            acceleration,
        }
    }

    /// Scale applied to the PID output before accumulating it.
    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    /// The driven actuator.
    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}

impl<A: Actuator> OutputStage for AccumulatingOutput<A> {
    fn apply(&mut self, pid_output: f64) {
        let output = self.actuator.output() + pid_output * self.acceleration;
        self.actuator.write(output.clamp(-1.0, 1.0));
    }

    fn neutral(&mut self) {
        self.actuator.stop();
    }
}

/// Feeds the PID output to the rotate axis of a drivetrain while mixing in a forward speed.
pub struct ArcadeOutput<D: Drivetrain> {
    drivetrain: D,
    forward: Setpoint,
}

impl<D: Drivetrain> ArcadeOutput<D> {
    /// Rotates `drivetrain` with the PID output while driving at `forward`.
    pub fn new(drivetrain: D, forward: Setpoint) -> Self {
        Self {
            drivetrain,
            forward,
        }
    }

    /// The driven drivetrain.
    pub fn drivetrain(&self) -> &D {
        &self.drivetrain
    }

    /// Mutable access to the driven drivetrain.
    pub fn drivetrain_mut(&mut self) -> &mut D {
        &mut self.drivetrain
    }
}

impl<D: Drivetrain> OutputStage for ArcadeOutput<D> {
    fn apply(&mut self, pid_output: f64) {
        let forward = self.forward.get();
        self.drivetrain.arcade_drive(forward, pid_output);
    }

    fn neutral(&mut self) {
        self.drivetrain.stop();
    }
}

impl<D: Drivetrain + core::fmt::Debug> core::fmt::Debug for ArcadeOutput<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ArcadeOutput")
            .field("drivetrain", &self.drivetrain)
            .field("forward", &self.forward)
            .finish()
    }
}
