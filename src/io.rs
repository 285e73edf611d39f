// Hardware-facing capabilities consumed by the motion tasks
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

use alloc::rc::Rc;
use core::cell::RefCell;

use num_traits::float::FloatCore;

/// What a feedback source reports.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SourceMode {
    /// Absolute position, e.g. encoder distance or gyro angle
    #[default]
    Position,
    /// Rate of change, e.g. encoder velocity
    Rate,
}

/// A sensor reporting the current value in the same unit as the setpoint and the tolerance.
pub trait FeedbackSource {
    /// Samples the sensor in its current mode.
    fn read(&mut self) -> f64;

    /// Switches between position and rate readings.
    fn set_mode(&mut self, mode: SourceMode);
}

/// A single-output mechanism driven by a command in [-1, 1].
pub trait Actuator {
    /// Commands the mechanism. `output` is in [-1, 1].
    fn write(&mut self, output: f64);

    /// The last output written to the mechanism.
    fn output(&self) -> f64;

    /// Puts the mechanism in its neutral state.
    fn stop(&mut self) {
        self.write(0.0);
    }

    /// Whether the mechanism may move at `speed`, e.g. false when pressing a limit switch in the
    /// direction of travel. Mechanisms without limits always allow motion.
    fn can_move(&self, _speed: f64) -> bool {
        true
    }
}

/// A two-sided drivetrain steered with a forward and a rotate axis.
pub trait Drivetrain {
    /// Drives with a forward and a rotate command, each in [-1, 1].
    fn arcade_drive(&mut self, forward: f64, rotate: f64);

    /// Puts the drivetrain in neutral.
    fn stop(&mut self) {
        self.arcade_drive(0.0, 0.0);
    }
}

/// An actuator that refuses to move wherever `limit` returns false, such as a lift pressing its
/// top switch while commanded upward.
#[derive(Debug)]
pub struct LimitedActuator<A: Actuator, F: Fn(f64) -> bool> {
    actuator: A,
    limit: F,
}

impl<A: Actuator, F: Fn(f64) -> bool> LimitedActuator<A, F> {
    /// Wraps `actuator`; `limit(speed)` returns false where motion is refused.
    pub fn new(actuator: A, limit: F) -> Self {
        Self { actuator, limit }
    }

    /// The wrapped actuator.
    pub fn inner(&self) -> &A {
        &self.actuator
    }
}

impl<A: Actuator, F: Fn(f64) -> bool> Actuator for LimitedActuator<A, F> {
    fn write(&mut self, output: f64) {
        if self.can_move(output) {
            self.actuator.write(output);
        } else {
            self.actuator.stop();
        }
    }

    fn output(&self) -> f64 {
        self.actuator.output()
    }

    fn stop(&mut self) {
        self.actuator.stop();
    }

    fn can_move(&self, speed: f64) -> bool {
        (self.limit)(speed) && self.actuator.can_move(speed)
    }
}

/// Mixes arcade axes into (left, right) side outputs, scaling both sides down together when
/// either would leave [-1, 1].
pub fn arcade_to_tank(forward: f64, rotate: f64) -> (f64, f64) {
    let left = forward + rotate;
    let right = forward - rotate;
    let max = left.abs().max(right.abs());
    if max > 1.0 {
        (left / max, right / max)
    } else {
        (left, right)
    }
}

impl<T: FeedbackSource + ?Sized> FeedbackSource for &mut T {
    fn read(&mut self) -> f64 {
        (**self).read()
    }

    fn set_mode(&mut self, mode: SourceMode) {
        (**self).set_mode(mode)
    }
}

impl<T: Actuator + ?Sized> Actuator for &mut T {
    fn write(&mut self, output: f64) {
        (**self).write(output)
    }

    fn output(&self) -> f64 {
        (**self).output()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn can_move(&self, speed: f64) -> bool {
        (**self).can_move(speed)
    }
}

impl<T: Drivetrain + ?Sized> Drivetrain for &mut T {
    fn arcade_drive(&mut self, forward: f64, rotate: f64) {
        (**self).arcade_drive(forward, rotate)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

// Shared handles let a scheduler hand the same mechanism to whichever task currently owns it.

impl<T: FeedbackSource + ?Sized> FeedbackSource for Rc<RefCell<T>> {
    fn read(&mut self) -> f64 {
        self.borrow_mut().read()
    }

    fn set_mode(&mut self, mode: SourceMode) {
        self.borrow_mut().set_mode(mode)
    }
}

impl<T: Actuator + ?Sized> Actuator for Rc<RefCell<T>> {
    fn write(&mut self, output: f64) {
        self.borrow_mut().write(output)
    }

    fn output(&self) -> f64 {
        self.borrow().output()
    }

    fn stop(&mut self) {
        self.borrow_mut().stop()
    }

    fn can_move(&self, speed: f64) -> bool {
        self.borrow().can_move(speed)
    }
}

impl<T: Drivetrain + ?Sized> Drivetrain for Rc<RefCell<T>> {
    fn arcade_drive(&mut self, forward: f64, rotate: f64) {
        self.borrow_mut().arcade_drive(forward, rotate)
    }

    fn stop(&mut self) {
        self.borrow_mut().stop()
    }
}
