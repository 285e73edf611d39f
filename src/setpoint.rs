// Lazily evaluated targets and suppliers
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

use alloc::boxed::Box;
use core::fmt;

use crate::io::FeedbackSource;

/// A value re-read every tick: either fixed or produced by a closure.
///
/// Used for setpoints, forward speeds and the speed of limit-bounded moves.
pub enum Setpoint {
    /// A fixed value
    Constant(f64),
    /// A closure evaluated on every read
    Dynamic(Box<dyn FnMut() -> f64>),
}

impl Setpoint {
    /// Wraps a closure evaluated on every read.
    pub fn dynamic(supplier: impl FnMut() -> f64 + 'static) -> Self {
        Setpoint::Dynamic(Box::new(supplier))
    }

    /// Evaluates the current value.
    pub fn get(&mut self) -> f64 {
        match self {
            Setpoint::Constant(value) => *value,
            Setpoint::Dynamic(supplier) => supplier(),
        }
    }

    /// Shifts a robot-relative target into the frame captured by `reference`.
    ///
    /// The reference is sampled once, here; later changes of the sensed value do not move the
    /// target. The resulting target is `relative - reference`.
    pub fn relative_to<S: FeedbackSource + ?Sized>(self, reference: &mut S) -> Self {
        let frame = reference.read();
        log::debug!("captured reference frame at {frame}");
        match self {
            Setpoint::Constant(relative) => Setpoint::Constant(relative - frame),
            Setpoint::Dynamic(mut relative) => Setpoint::dynamic(move || relative() - frame),
        }
    }
}

impl From<f64> for Setpoint {
    fn from(value: f64) -> Self {
        Setpoint::Constant(value)
    }
}

impl fmt::Debug for Setpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setpoint::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Setpoint::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// An extra termination condition polled every tick.
pub enum DonePredicate {
    /// Never finishes the task
    Never,
    /// A closure polled on every check
    Dynamic(Box<dyn FnMut() -> bool>),
}

impl DonePredicate {
    /// Wraps a closure polled on every check.
    pub fn dynamic(predicate: impl FnMut() -> bool + 'static) -> Self {
        DonePredicate::Dynamic(Box::new(predicate))
    }

    /// Polls the predicate.
    pub fn get(&mut self) -> bool {
        match self {
            DonePredicate::Never => false,
            DonePredicate::Dynamic(predicate) => predicate(),
        }
    }
}

impl Default for DonePredicate {
    fn default() -> Self {
        DonePredicate::Never
    }
}

impl fmt::Debug for DonePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DonePredicate::Never => f.write_str("Never"),
            DonePredicate::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}
