// The PID runtime controller driven once per scheduler tick
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

use num_traits::float::FloatCore;

use crate::time::InstantLike;

/// Errors raised when a PID configuration value is rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum PidConfigError {
    /// The proportional gain was zero, negative or not finite
    #[cfg_attr(feature = "std", error("proportional gain must be positive and finite"))]
    InvalidProportionalGain,
    /// The integral gain was negative or not finite
    #[cfg_attr(feature = "std", error("integral gain must be non-negative and finite"))]
    InvalidIntegralGain,
    /// The derivative gain was negative or not finite
    #[cfg_attr(feature = "std", error("derivative gain must be non-negative and finite"))]
    InvalidDerivativeGain,
    /// The sample time was zero or too large to be represented as seconds
    #[cfg_attr(feature = "std", error("sample time must be positive and finite"))]
    InvalidSampleTime,
    /// The output limits were NaN or not strictly ordered
    #[cfg_attr(feature = "std", error("output limits must satisfy min < max"))]
    InvalidOutputLimits,
}

/// Gains, sampling period and output limits of a [`PidController`].
///
/// The integral and derivative gains are "total" gains; they are folded with the sample time
/// internally so that changing the sample time keeps the continuous-time behavior.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidConfig {
    kp: f64,
    /// ki * Ts
    ki: f64,
    /// kd / Ts
    kd: f64,
    sample_time: Duration,
    output_min: f64,
    output_max: f64,
}

impl Default for PidConfig {
    /// kp = 1, ki = kd = 0, 20ms sample time (one robot scheduler period), output in [-1, 1]
    fn default() -> Self {
        PidConfig {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
            sample_time: Duration::from_millis(20),
            output_min: -1.0,
            output_max: 1.0,
        }
    }
}

impl PidConfig {
    /// Returns the proportional gain.
    pub fn kp(&self) -> f64 {
        self.kp
    }

    /// Returns the total integral gain.
    pub fn ki(&self) -> f64 {
        self.ki / self.sample_time.as_secs_f64()
    }

    /// Returns the total derivative gain.
    pub fn kd(&self) -> f64 {
        self.kd * self.sample_time.as_secs_f64()
    }

    /// Returns the sampling time.
    pub fn sample_time(&self) -> Duration {
        self.sample_time
    }

    /// Returns the minimum output limit.
    pub fn output_min(&self) -> f64 {
        self.output_min
    }

    /// Returns the maximum output limit.
    pub fn output_max(&self) -> f64 {
        self.output_max
    }

    /// Sets the proportional gain. It must be positive and finite.
    pub fn set_kp(&mut self, kp: f64) -> Result<(), PidConfigError> {
        if kp <= 0.0 || !kp.is_finite() {
            return Err(PidConfigError::InvalidProportionalGain);
        }
        self.kp = kp;
        Ok(())
    }

    /// Sets the total integral gain. Zero disables the integral term.
    pub fn set_ki(&mut self, ki: f64) -> Result<(), PidConfigError> {
        if ki < 0.0 || !ki.is_finite() {
            return Err(PidConfigError::InvalidIntegralGain);
        }
        self.ki = ki * self.sample_time.as_secs_f64();
        Ok(())
    }

    /// Sets the total derivative gain. Zero disables the derivative term.
    pub fn set_kd(&mut self, kd: f64) -> Result<(), PidConfigError> {
        if kd < 0.0 || !kd.is_finite() {
            return Err(PidConfigError::InvalidDerivativeGain);
        }
        self.kd = kd / self.sample_time.as_secs_f64();
        Ok(())
    }

    /// Sets the sample time and rescales the internal gains so the total gains are unchanged.
    pub fn set_sample_time(&mut self, sample_time: Duration) -> Result<(), PidConfigError> {
        let secs = sample_time.as_secs_f64();
        if secs <= 0.0 || sample_time == Duration::MAX {
            return Err(PidConfigError::InvalidSampleTime);
        }

        let ratio = secs / self.sample_time.as_secs_f64();
        self.ki *= ratio;
        self.kd /= ratio;
        self.sample_time = sample_time;
        Ok(())
    }

    /// Sets the output limits. Infinite limits disable clamping on that side.
    pub fn set_output_limits(&mut self, output_min: f64, output_max: f64) -> Result<(), PidConfigError> {
        if output_min.is_nan() || output_max.is_nan() || output_min >= output_max {
            return Err(PidConfigError::InvalidOutputLimits);
        }
        self.output_min = output_min;
        self.output_max = output_max;
        Ok(())
    }
}

/// Builder for [`PidConfig`] that validates every field on `build`.
#[derive(Copy, Clone, Debug, Default)]
pub struct PidConfigBuilder {
    kp: Option<f64>,
    ki: Option<f64>,
    kd: Option<f64>,
    sample_time: Option<Duration>,
    output_limits: Option<(f64, f64)>,
}

impl PidConfigBuilder {
    /// Sets the proportional gain.
    pub fn kp(mut self, kp: f64) -> Self {
        self.kp = Some(kp);
        self
    }

    /// Sets the total integral gain.
    pub fn ki(mut self, ki: f64) -> Self {
        self.ki = Some(ki);
        self
    }

    /// Sets the total derivative gain.
    pub fn kd(mut self, kd: f64) -> Self {
        self.kd = Some(kd);
        self
    }

    /// Sets the sampling period.
    pub fn sample_time(mut self, sample_time: Duration) -> Self {
        self.sample_time = Some(sample_time);
        self
    }

    /// Sets the output limits.
    pub fn output_limits(mut self, output_min: f64, output_max: f64) -> Self {
        self.output_limits = Some((output_min, output_max));
        self
    }

    /// Validates the accumulated values. The sample time is applied first so the gains are
    /// scaled against the final sampling period.
    pub fn build(self) -> Result<PidConfig, PidConfigError> {
        let mut config = PidConfig::default();
        if let Some(sample_time) = self.sample_time {
            config.set_sample_time(sample_time)?;
        }
        if let Some(kp) = self.kp {
            config.set_kp(kp)?;
        }
        if let Some(ki) = self.ki {
            config.set_ki(ki)?;
        }
        if let Some(kd) = self.kd {
            config.set_kd(kd)?;
        }
        if let Some((lo, hi)) = self.output_limits {
            config.set_output_limits(lo, hi)?;
        }
        Ok(config)
    }
}

/// A stateful PID controller that holds its own setpoint.
///
/// One controller is created for each run of a motion task and dropped when the run ends, so
/// integral state never leaks from one run into the next.
///
/// Changing the setpoint leaves the integral and derivative state untouched. Large jumps in the
/// setpoint therefore carry the accumulated integral over to the new target.
#[derive(Clone, Debug)]
pub struct PidController<I: InstantLike> {
    config: PidConfig,
    setpoint: f64,
    i_term: f64,
    last_err: f64,
    last_output: f64,
    last_time: Option<I>,
    enabled: bool,
    need_initialize: bool,
}

impl<I: InstantLike> PidController<I> {
    /// Creates a disabled controller with a zero setpoint.
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            setpoint: 0.0,
            i_term: 0.0,
            last_err: 0.0,
            last_output: 0.0,
            last_time: None,
            enabled: false,
            need_initialize: true,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// Returns the configuration for in-place changes.
    pub fn config_mut(&mut self) -> &mut PidConfig {
        &mut self.config
    }

    /// Returns the current setpoint.
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Moves the target without touching the integral or derivative state.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    /// The error seen by the last computation.
    pub fn error(&self) -> f64 {
        self.last_err
    }

    /// Returns the output of the last computation.
    pub fn output(&self) -> f64 {
        self.last_output
    }

    /// Returns the time of the last computation, if any.
    pub fn last_time(&self) -> Option<I> {
        self.last_time
    }

    /// True when the last computed error is within `tolerance` of the setpoint.
    pub fn on_target(&self, tolerance: f64) -> bool {
        self.last_err.abs() <= tolerance
    }

    /// True between `enable` and `disable`.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables the controller. The next computation re-initializes the state from the last
    /// output so the transition is bumpless.
    pub fn enable(&mut self) {
        if !self.enabled {
            self.need_initialize = true;
        }
        self.enabled = true;
    }

    /// Freezes the controller; `compute` returns the last output until re-enabled.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Clears the accumulated integral term.
    pub fn reset_integral(&mut self) {
        self.i_term = 0.0;
    }

    /// Runs one step of the control law against `input`.
    ///
    /// Returns the last output unchanged if the controller is disabled or if less than one sample
    /// time has elapsed since the last computation.
    pub fn compute(&mut self, input: f64, timestamp: I) -> f64 {
        self.try_compute(input, timestamp).unwrap_or(self.last_output)
    }

    /// Like [`Self::compute`], but returns `None` instead of the cached output when no new sample
    /// was taken. Consumers that integrate the output must only act on `Some`.
    pub fn try_compute(&mut self, input: f64, timestamp: I) -> Option<f64> {
        if !self.enabled {
            return None;
        }

        let error = self.setpoint - input;

        if self.need_initialize {
            self.last_err = error;
            self.i_term = self
                .last_output
                .clamp(self.config.output_min, self.config.output_max);
            self.need_initialize = false;
        } else if let Some(last_time) = self.last_time {
            if timestamp.duration_since(last_time) < self.config.sample_time {
                return None;
            }
        }

        self.i_term = (self.i_term + self.config.ki * error)
            .clamp(self.config.output_min, self.config.output_max);

        let output = self.config.kp * error + self.i_term + self.config.kd * (error - self.last_err);
        let clamped_output = output.clamp(self.config.output_min, self.config.output_max);

        self.last_err = error;
        self.last_time = Some(timestamp);
        self.last_output = clamped_output;
        Some(clamped_output)
    }
}
