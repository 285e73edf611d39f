// Tunable settings shared by every settling motion task
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

use crate::pid::{PidConfig, PidConfigBuilder, PidConfigError};

/// Errors raised when [`PidSettings`] are rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum SettingsError {
    /// One of the gains was rejected by the PID controller
    #[cfg_attr(feature = "std", error(transparent))]
    Gain(#[cfg_attr(feature = "std", from)] PidConfigError),
    /// The tolerance was negative or NaN
    #[cfg_attr(feature = "std", error("tolerance must be a non-negative number"))]
    InvalidTolerance,
}

#[cfg(not(feature = "std"))]
impl From<PidConfigError> for SettingsError {
    fn from(err: PidConfigError) -> Self {
        SettingsError::Gain(err)
    }
}

/// Gains and termination thresholds of a settling motion task.
///
/// `tolerance` is in the same unit as the setpoint and the feedback source. `wait_time` is how
/// long the error must stay within `tolerance` before the task counts as settled.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PidSettings {
    kp: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    ki: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    kd: f64,
    tolerance: f64,
    #[cfg_attr(feature = "serde", serde(with = "secs_f64", default))]
    wait_time: Duration,
}

impl PidSettings {
    /// Validated constructor. Gains follow the rules of [`PidConfig`].
    pub fn new(
        kp: f64,
        ki: f64,
        kd: f64,
        tolerance: f64,
        wait_time: Duration,
    ) -> Result<Self, SettingsError> {
        let mut settings = Self {
            kp,
            ki,
            kd,
            tolerance: 0.0,
            wait_time,
        };
        settings.set_tolerance(tolerance)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Starts a builder with kp = 1 and everything else zero.
    pub fn builder() -> PidSettingsBuilder {
        PidSettingsBuilder::default()
    }

    /// Proportional gain.
    pub fn kp(&self) -> f64 {
        self.kp
    }

    /// Total integral gain.
    pub fn ki(&self) -> f64 {
        self.ki
    }

    /// Total derivative gain.
    pub fn kd(&self) -> f64 {
        self.kd
    }

    /// Largest error magnitude still considered on target.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// How long the error must stay within tolerance.
    pub fn wait_time(&self) -> Duration {
        self.wait_time
    }

    /// Changes the tolerance. Negative or NaN values are rejected and the old value kept.
    pub fn set_tolerance(&mut self, tolerance: f64) -> Result<(), SettingsError> {
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(SettingsError::InvalidTolerance);
        }
        self.tolerance = tolerance;
        Ok(())
    }

    /// Changes the settle time.
    pub fn set_wait_time(&mut self, wait_time: Duration) {
        self.wait_time = wait_time;
    }

    /// Re-checks every field; used after deserializing settings from a file.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(SettingsError::InvalidTolerance);
        }
        self.pid_config(PidConfig::default().sample_time(), 1.0)
            .map(|_| ())
    }

    /// Builds the configuration for a fresh PID controller with a symmetric output range.
    pub fn pid_config(
        &self,
        sample_time: Duration,
        output_range: f64,
    ) -> Result<PidConfig, SettingsError> {
        let config = PidConfigBuilder::default()
            .sample_time(sample_time)
            .kp(self.kp)
            .ki(self.ki)
            .kd(self.kd)
            .output_limits(-output_range, output_range)
            .build()?;
        Ok(config)
    }
}

/// Builder for [`PidSettings`]. Unset gains default to zero except kp, which defaults to one.
#[derive(Copy, Clone, Debug)]
pub struct PidSettingsBuilder {
    kp: f64,
    ki: f64,
    kd: f64,
    tolerance: f64,
    wait_time: Duration,
}

impl Default for PidSettingsBuilder {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
            tolerance: 0.0,
            wait_time: Duration::ZERO,
        }
    }
}

impl PidSettingsBuilder {
    /// Sets the proportional gain.
    pub fn kp(mut self, kp: f64) -> Self {
        self.kp = kp;
        self
    }

    /// Sets the total integral gain.
    pub fn ki(mut self, ki: f64) -> Self {
        self.ki = ki;
        self
    }

    /// Sets the total derivative gain.
    pub fn kd(mut self, kd: f64) -> Self {
        self.kd = kd;
        self
    }

    /// Sets the on-target tolerance.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the settle time.
    pub fn wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time;
        self
    }

    /// Validates and builds the settings.
    pub fn build(self) -> Result<PidSettings, SettingsError> {
        PidSettings::new(self.kp, self.ki, self.kd, self.tolerance, self.wait_time)
    }
}

/// Wait times are written as plain seconds in configuration files.
#[cfg(feature = "serde")]
mod secs_f64 {
    use core::time::Duration;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_validates_tolerance_and_gains() {
        assert_eq!(
            PidSettings::builder().tolerance(-1.0).build(),
            Err(SettingsError::InvalidTolerance)
        );
        assert_eq!(
            PidSettings::builder().tolerance(f64::NAN).build(),
            Err(SettingsError::InvalidTolerance)
        );
        assert_eq!(
            PidSettings::builder().kp(0.0).build(),
            Err(SettingsError::Gain(PidConfigError::InvalidProportionalGain))
        );
        assert_eq!(
            PidSettings::builder().ki(-0.1).build(),
            Err(SettingsError::Gain(PidConfigError::InvalidIntegralGain))
        );

        let settings = PidSettings::builder()
            .kp(0.5)
            .tolerance(2.0)
            .wait_time(Duration::from_millis(500))
            .build()
            .unwrap();
        assert_eq!(settings.tolerance(), 2.0);
        assert_eq!(settings.wait_time(), Duration::from_millis(500));
    }

    #[test]
    fn test_setters_keep_old_value_on_error() {
        let mut settings = PidSettings::builder().tolerance(1.0).build().unwrap();
        assert!(settings.set_tolerance(-3.0).is_err());
        assert_eq!(settings.tolerance(), 1.0);
        settings.set_wait_time(Duration::from_secs(2));
        assert_eq!(settings.wait_time(), Duration::from_secs(2));
    }

    #[test]
    fn test_pid_config_uses_output_range() {
        let settings = PidSettings::builder().kp(2.0).build().unwrap();
        let config = settings
            .pid_config(Duration::from_millis(20), 0.6)
            .unwrap();
        assert_eq!(config.output_min(), -0.6);
        assert_eq!(config.output_max(), 0.6);
        assert_eq!(config.kp(), 2.0);
        assert!(settings.pid_config(Duration::from_millis(20), 0.0).is_err());
    }
}
