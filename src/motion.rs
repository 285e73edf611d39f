// Settling motion tasks: one state machine, four termination/output strategies
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

use crate::io::{Actuator, Drivetrain, FeedbackSource, SourceMode};
use crate::output::{AccumulatingOutput, ArcadeOutput, DirectOutput, OutputStage};
use crate::pid::{PidConfig, PidConfigError};
use crate::pid_loop::SettlingPidLoop;
use crate::settings::{PidSettings, SettingsError};
use crate::setpoint::{DonePredicate, Setpoint};
use crate::settle::SettleTimer;
use crate::task::{Task, TaskState};
use crate::time::{has_elapsed, InstantLike};

/// Errors raised while constructing or configuring a motion task.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum MotionError {
    /// The gains or thresholds were rejected
    #[cfg_attr(feature = "std", error(transparent))]
    Settings(#[cfg_attr(feature = "std", from)] SettingsError),
    /// The rate-hold acceleration was not finite
    #[cfg_attr(feature = "std", error("acceleration must be finite"))]
    InvalidAcceleration,
    /// The output range was not in (0, 1]
    #[cfg_attr(feature = "std", error("output range must be in (0, 1]"))]
    InvalidOutputRange,
    /// The input range was not positive and finite
    #[cfg_attr(feature = "std", error("input range must be positive and finite"))]
    InvalidInputRange,
}

#[cfg(not(feature = "std"))]
impl From<SettingsError> for MotionError {
    fn from(err: SettingsError) -> Self {
        MotionError::Settings(err)
    }
}

impl From<PidConfigError> for MotionError {
    fn from(err: PidConfigError) -> Self {
        MotionError::Settings(SettingsError::Gain(err))
    }
}

/// Which motion a [`SettlingMotionTask`] performs. Selects the termination rule.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MotionKind {
    /// Drive an actuator to a setpoint; done once settled
    PositionHold,
    /// Hold a speed by integrating the loop output; never done by itself
    RateHold,
    /// Steer a drivetrain while driving forward; done on timeout or the extra predicate
    ArcadeOrient,
    /// Turn a drivetrain in place; done once settled or on timeout
    HeadingHold,
}

/// A PID loop with a "reached and held" termination rule.
///
/// `O` decides how the loop output reaches the mechanism and [`MotionKind`] decides when the
/// task is done. Each run builds a fresh PID controller in `on_start` and drops it in `on_end`
/// or `on_cancel`, which also put the mechanism in neutral exactly once.
///
/// Within a tick the setpoint is re-read first, then the controller computes, then the output is
/// written, and the termination check comes last in `is_finished`.
pub struct SettlingMotionTask<I: InstantLike, S: FeedbackSource, O: OutputStage> {
    kind: MotionKind,
    settings: PidSettings,
    config: PidConfig,
    setpoint: Setpoint,
    pid_loop: SettlingPidLoop<I, S, O>,
    extra_done: DonePredicate,
    timeout: Option<Duration>,
    settle: Option<SettleTimer<I>>,
    started_at: Option<I>,
    state: TaskState,
}

/// Drives an actuator to a position and finishes once settled.
pub type PositionHoldTask<I, S, A> = SettlingMotionTask<I, S, DirectOutput<A>>;
/// Holds a speed until cancelled.
pub type RateHoldTask<I, S, A> = SettlingMotionTask<I, S, AccumulatingOutput<A>>;
/// Steers a drivetrain toward an angle.
pub type DriveTask<I, S, D> = SettlingMotionTask<I, S, ArcadeOutput<D>>;

impl<I: InstantLike, S: FeedbackSource, O: OutputStage> SettlingMotionTask<I, S, O> {
    /// Assembles a task from its parts. The variant constructors below are the usual entry
    /// points.
    pub fn new(
        kind: MotionKind,
        source: S,
        output: O,
        setpoint: Setpoint,
        settings: PidSettings,
    ) -> Result<Self, MotionError> {
        settings.validate()?;
        let config = settings.pid_config(PidConfig::default().sample_time(), 1.0)?;
        Ok(Self {
            kind,
            settings,
            config,
            setpoint,
            pid_loop: SettlingPidLoop::new(source, output),
            extra_done: DonePredicate::Never,
            timeout: None,
            settle: None,
            started_at: None,
            state: TaskState::Idle,
        })
    }

    /// Sets the period at which the controller expects to be computed. Defaults to 20ms.
    pub fn with_sample_time(mut self, sample_time: Duration) -> Result<Self, MotionError> {
        self.config.set_sample_time(sample_time)?;
        Ok(self)
    }

    /// Treats the feedback as continuous, wrapping every `input_range` units; e.g. 360 for a
    /// gyro reporting degrees. The error is then taken the short way round, both for the
    /// controller and for the on-target check.
    pub fn with_input_range(mut self, input_range: f64) -> Result<Self, MotionError> {
        if !(input_range > 0.0 && input_range.is_finite()) {
            return Err(MotionError::InvalidInputRange);
        }
        self.pid_loop.set_input_range(Some(input_range));
        Ok(self)
    }

    /// The motion this task performs.
    pub fn kind(&self) -> MotionKind {
        self.kind
    }

    /// The gains and thresholds in use.
    pub fn settings(&self) -> &PidSettings {
        &self.settings
    }

    /// Changes the tolerance. A running task uses it from the next tick on.
    pub fn set_tolerance(&mut self, tolerance: f64) -> Result<(), MotionError> {
        self.settings.set_tolerance(tolerance)?;
        Ok(())
    }

    /// Changes the settle time. A running task uses it from the next termination check on.
    pub fn set_wait_time(&mut self, wait_time: Duration) {
        self.settings.set_wait_time(wait_time);
    }

    /// The underlying PID loop.
    pub fn pid_loop(&self) -> &SettlingPidLoop<I, S, O> {
        &self.pid_loop
    }

    /// Mutable access to the underlying PID loop.
    pub fn pid_loop_mut(&mut self) -> &mut SettlingPidLoop<I, S, O> {
        &mut self.pid_loop
    }

    /// Error of the latest tick.
    pub fn error(&self) -> f64 {
        self.pid_loop.error()
    }

    /// Time since the current run started, or zero if the task is not running.
    pub fn elapsed(&self, now: I) -> Duration {
        match (self.state, self.started_at) {
            (TaskState::Running, Some(start)) => now.duration_since(start),
            _ => Duration::ZERO,
        }
    }

    fn settled(&self, now: I) -> bool {
        self.settle
            .map_or(false, |settle| settle.is_settled(self.settings.wait_time(), now))
    }

    fn timed_out(&self, now: I) -> bool {
        match (self.timeout, self.started_at) {
            (Some(timeout), Some(start)) => has_elapsed(start, now, timeout),
            _ => false,
        }
    }

    fn finish(&mut self, state: TaskState) {
        if !self.state.is_running() {
            return;
        }
        self.pid_loop.disable();
        self.state = state;
        log::debug!("{:?} {:?} with error {}", self.kind, state, self.pid_loop.error());
    }
}

impl<I: InstantLike, S: FeedbackSource, O: OutputStage> Task<I> for SettlingMotionTask<I, S, O> {
    fn on_start(&mut self, now: I) {
        let setpoint = self.setpoint.get();
        self.pid_loop.enable(self.config, setpoint);
        self.settle = Some(SettleTimer::new(now));
        self.started_at = Some(now);
        self.state = TaskState::Running;
        log::debug!("{:?} started toward {}", self.kind, setpoint);
    }

    fn on_tick(&mut self, now: I) {
        if !self.state.is_running() {
            return;
        }
        let setpoint = self.setpoint.get();
        self.pid_loop.update_setpoint(setpoint);
        self.pid_loop.step(now);

        let on_target = self.pid_loop.on_target(self.settings.tolerance());
        if let Some(settle) = self.settle.as_mut() {
            settle.update(on_target, now);
        }
    }

    fn is_finished(&mut self, now: I) -> bool {
        if !self.state.is_running() {
            return matches!(self.state, TaskState::Done | TaskState::Cancelled);
        }
        match self.kind {
            MotionKind::PositionHold => self.settled(now),
            MotionKind::RateHold => false,
            MotionKind::ArcadeOrient => {
                if self.timed_out(now) {
                    log::warn!("{:?} timed out", self.kind);
                    return true;
                }
                self.extra_done.get()
            }
            MotionKind::HeadingHold => {
                if self.settled(now) {
                    return true;
                }
                let timed_out = self.timed_out(now);
                if timed_out {
                    log::warn!(
                        "{:?} timed out before settling, error {}",
                        self.kind,
                        self.pid_loop.error()
                    );
                }
                timed_out
            }
        }
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

impl<I: InstantLike, S: FeedbackSource, A: Actuator> PositionHoldTask<I, S, A> {
    /// Moves `actuator` until `source` reads `setpoint` within tolerance for the settle time.
    pub fn position_hold(
        actuator: A,
        source: S,
        setpoint: impl Into<Setpoint>,
        settings: PidSettings,
    ) -> Result<Self, MotionError> {
        Self::new(
            MotionKind::PositionHold,
            source,
            DirectOutput::new(actuator),
            setpoint.into(),
            settings,
        )
    }

    /// The driven actuator.
    pub fn actuator(&self) -> &A {
        self.pid_loop.output_stage().actuator()
    }
}

impl<I: InstantLike, S: FeedbackSource, A: Actuator> RateHoldTask<I, S, A> {
    /// Holds `actuator` at the speed `setpoint`, changing its command by at most
    /// `acceleration` per unit of loop output each tick. Switches `source` to rate mode.
    ///
    /// The task never finishes by itself; the scheduler ends it by cancelling it.
    pub fn rate_hold(
        actuator: A,
        mut source: S,
        setpoint: impl Into<Setpoint>,
        settings: PidSettings,
        acceleration: f64,
    ) -> Result<Self, MotionError> {
        if !acceleration.is_finite() {
            return Err(MotionError::InvalidAcceleration);
        }
        source.set_mode(SourceMode::Rate);
        Self::new(
            MotionKind::RateHold,
            source,
            AccumulatingOutput::new(actuator, acceleration),
            setpoint.into(),
            settings,
        )
    }

    /// The driven actuator.
    pub fn actuator(&self) -> &A {
        self.pid_loop.output_stage().actuator()
    }
}

impl<I: InstantLike, S: FeedbackSource, D: Drivetrain> DriveTask<I, S, D> {
    /// Steers `drivetrain` toward the angle `setpoint` while driving at `forward`.
    ///
    /// Finishes once `extra_done` reports true or the timeout (see [`Self::with_timeout`])
    /// expires; being on target alone does not end the task.
    pub fn arcade_orient(
        drivetrain: D,
        source: S,
        setpoint: impl Into<Setpoint>,
        forward: impl Into<Setpoint>,
        extra_done: DonePredicate,
        settings: PidSettings,
    ) -> Result<Self, MotionError> {
        let mut task = Self::new(
            MotionKind::ArcadeOrient,
            source,
            ArcadeOutput::new(drivetrain, forward.into()),
            setpoint.into(),
            settings,
        )?;
        task.extra_done = extra_done;
        Ok(task)
    }

    /// Turns `drivetrain` in place toward the angle `setpoint`. Finishes once settled or when
    /// the timeout expires.
    pub fn heading_hold(
        drivetrain: D,
        source: S,
        setpoint: impl Into<Setpoint>,
        settings: PidSettings,
    ) -> Result<Self, MotionError> {
        Self::new(
            MotionKind::HeadingHold,
            source,
            ArcadeOutput::new(drivetrain, Setpoint::Constant(0.0)),
            setpoint.into(),
            settings,
        )
    }

    /// Like [`Self::heading_hold`], but `relative_setpoint` is shifted into the frame of the
    /// angle `source` reads right now: the target becomes `relative_setpoint - angle`. The frame
    /// is captured once; turning the robot afterwards does not move the target.
    pub fn heading_hold_from_frame(
        drivetrain: D,
        mut source: S,
        relative_setpoint: impl Into<Setpoint>,
        settings: PidSettings,
    ) -> Result<Self, MotionError> {
        let setpoint = relative_setpoint.into().relative_to(&mut source);
        Self::heading_hold(drivetrain, source, setpoint, settings)
    }

    /// Hard limit on how long a run may take, measured from `on_start`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Limits the rotate command to `[-output_range, output_range]`.
    pub fn with_output_range(mut self, output_range: f64) -> Result<Self, MotionError> {
        if !(output_range > 0.0 && output_range <= 1.0) {
            return Err(MotionError::InvalidOutputRange);
        }
        self.config.set_output_limits(-output_range, output_range)?;
        Ok(self)
    }

    /// The hard time limit, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The driven drivetrain.
    pub fn drivetrain(&self) -> &D {
        self.pid_loop.output_stage().drivetrain()
    }
}
