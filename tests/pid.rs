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

use approx::assert_relative_eq;
use settling_pid::pid::{PidConfig, PidConfigBuilder, PidConfigError, PidController};
use settling_pid::time::Millis;
use std::time::Duration;

fn make_controller(config: PidConfig) -> PidController<Millis> {
    let mut pid = PidController::new(config);
    pid.enable();
    pid
}

mod test_pid_config {

    use super::*;

    const NEW_KP: f64 = 10.0;
    // Zero, negative and non-finite kp are invalid
    const INVALID_KP_VALUES: &[f64; 4] = &[0.0, -1.0, f64::INFINITY, f64::NAN];

    #[test]
    fn test_get_and_set_kp() {
        let mut pid = make_controller(PidConfig::default());
        let config = pid.config_mut();

        // Default kp is 1
        assert_eq!(config.kp(), 1.0);

        assert!(config.set_kp(NEW_KP).is_ok());
        assert_eq!(config.kp(), NEW_KP);

        for it in INVALID_KP_VALUES {
            assert_eq!(
                config.set_kp(*it),
                Err(PidConfigError::InvalidProportionalGain)
            );

            // Failing to set kp should not change the value
            assert_eq!(config.kp(), NEW_KP);
        }
    }

    #[test]
    fn test_build_kp() {
        let built_config = PidConfigBuilder::default().kp(NEW_KP).build();
        assert_eq!(built_config.map(|config| config.kp()), Ok(NEW_KP));

        for it in INVALID_KP_VALUES {
            assert_eq!(
                PidConfigBuilder::default().kp(*it).build().map(|_| ()),
                Err(PidConfigError::InvalidProportionalGain)
            );
        }
    }

    const NEW_KI: f64 = 10.0;
    // Negative and non-finite ki are invalid
    const INVALID_KI_VALUES: &[f64; 3] = &[-1.0, f64::INFINITY, f64::NAN];

    #[test]
    fn test_get_and_set_ki() {
        let mut config = PidConfig::default();

        // Default ki is 0
        assert_eq!(config.ki(), 0.0);

        assert!(config.set_ki(NEW_KI).is_ok());
        assert_relative_eq!(config.ki(), NEW_KI);

        // Changing sample time does not change total ki
        assert!(config.set_sample_time(Duration::from_millis(150)).is_ok());
        assert_relative_eq!(config.ki(), NEW_KI);

        for it in INVALID_KI_VALUES {
            assert_eq!(config.set_ki(*it), Err(PidConfigError::InvalidIntegralGain));
            assert_relative_eq!(config.ki(), NEW_KI);
        }

        // Zero ki is valid
        assert!(config.set_ki(0.0).is_ok());
        assert_eq!(config.ki(), 0.0);
    }

    #[test]
    fn test_build_ki() {
        let built_config = PidConfigBuilder::default()
            .ki(NEW_KI)
            .sample_time(Duration::from_millis(200))
            .build()
            .unwrap();
        assert_relative_eq!(built_config.ki(), NEW_KI);
        assert_eq!(built_config.sample_time(), Duration::from_millis(200));

        for it in INVALID_KI_VALUES {
            assert_eq!(
                PidConfigBuilder::default().ki(*it).build().map(|_| ()),
                Err(PidConfigError::InvalidIntegralGain)
            );
        }
    }

    const NEW_KD: f64 = 10.0;
    const INVALID_KD_VALUES: &[f64; 3] = &[-1.0, f64::INFINITY, f64::NAN];

    #[test]
    fn test_get_and_set_kd() {
        let mut config = PidConfig::default();

        // Default kd is 0
        assert_eq!(config.kd(), 0.0);

        assert!(config.set_kd(NEW_KD).is_ok());
        assert_relative_eq!(config.kd(), NEW_KD);

        // Changing sample time does not change total kd
        assert!(config.set_sample_time(Duration::from_millis(150)).is_ok());
        assert_relative_eq!(config.kd(), NEW_KD);

        for it in INVALID_KD_VALUES {
            assert_eq!(
                config.set_kd(*it),
                Err(PidConfigError::InvalidDerivativeGain)
            );
            assert_relative_eq!(config.kd(), NEW_KD);
        }

        assert!(config.set_kd(0.0).is_ok());
        assert_eq!(config.kd(), 0.0);
    }

    #[test]
    fn test_build_kd() {
        let built_config = PidConfigBuilder::default()
            .kd(NEW_KD)
            .sample_time(Duration::from_millis(200))
            .build()
            .unwrap();
        assert_relative_eq!(built_config.kd(), NEW_KD);

        for it in INVALID_KD_VALUES {
            assert_eq!(
                PidConfigBuilder::default().kd(*it).build().map(|_| ()),
                Err(PidConfigError::InvalidDerivativeGain)
            );
        }
    }

    const NEW_SAMPLE_TIME: Duration = Duration::from_millis(100);
    const INVALID_SAMPLE_TIME_VALUES: &[Duration; 2] = &[Duration::ZERO, Duration::MAX];

    #[test]
    fn test_get_and_set_sample_time() {
        let mut config = PidConfigBuilder::default()
            .kp(2.0)
            .ki(0.5)
            .kd(0.1)
            .build()
            .unwrap();

        // Default sample time is one 20ms scheduler period
        assert_eq!(config.sample_time(), Duration::from_millis(20));

        assert!(config.set_sample_time(NEW_SAMPLE_TIME).is_ok());
        assert_eq!(config.sample_time(), NEW_SAMPLE_TIME);

        // Changing sample time does not change any of kp/ki/kd
        assert_eq!(config.kp(), 2.0);
        assert_relative_eq!(config.ki(), 0.5);
        assert_relative_eq!(config.kd(), 0.1);

        for it in INVALID_SAMPLE_TIME_VALUES {
            assert_eq!(
                config.set_sample_time(*it),
                Err(PidConfigError::InvalidSampleTime)
            );
            assert_eq!(config.sample_time(), NEW_SAMPLE_TIME);
        }

        for it in INVALID_SAMPLE_TIME_VALUES {
            assert_eq!(
                PidConfigBuilder::default().sample_time(*it).build().map(|_| ()),
                Err(PidConfigError::InvalidSampleTime)
            );
        }
    }

    const NEW_OUTPUT_MIN: f64 = -10.0;
    const NEW_OUTPUT_MAX: f64 = 10.0;
    const INVALID_OUTPUT_LIMITS: &[(f64, f64); 5] = &[
        (2.0, -2.0),
        (0.0, 0.0),
        (f64::NAN, 0.0),
        (0.0, f64::NAN),
        (f64::NAN, f64::NAN),
    ];

    #[test]
    fn test_get_and_set_output_limits() {
        let mut config = PidConfig::default();

        // Default output limits match a motor command
        assert_eq!(config.output_min(), -1.0);
        assert_eq!(config.output_max(), 1.0);

        assert!(config
            .set_output_limits(NEW_OUTPUT_MIN, NEW_OUTPUT_MAX)
            .is_ok());
        assert_eq!(config.output_min(), NEW_OUTPUT_MIN);
        assert_eq!(config.output_max(), NEW_OUTPUT_MAX);

        for (lb, ub) in INVALID_OUTPUT_LIMITS {
            assert_eq!(
                config.set_output_limits(*lb, *ub),
                Err(PidConfigError::InvalidOutputLimits)
            );
            assert_eq!(config.output_min(), NEW_OUTPUT_MIN);
            assert_eq!(config.output_max(), NEW_OUTPUT_MAX);
        }

        // Infinite limits switch clamping off
        assert!(config
            .set_output_limits(f64::NEG_INFINITY, f64::INFINITY)
            .is_ok());

        for (lb, ub) in INVALID_OUTPUT_LIMITS {
            assert_eq!(
                PidConfigBuilder::default()
                    .output_limits(*lb, *ub)
                    .build()
                    .map(|_| ()),
                Err(PidConfigError::InvalidOutputLimits)
            );
        }
    }
}

mod test_pid_controller {

    use super::*;

    fn integrating_config() -> PidConfig {
        PidConfigBuilder::default()
            .ki(1.0)
            .output_limits(-10.0, 10.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_proportional_only() {
        let mut pid = make_controller(PidConfig::default());
        pid.set_setpoint(0.5);
        assert_relative_eq!(pid.compute(0.0, Millis(0)), 0.5);
        assert_relative_eq!(pid.error(), 0.5);
        assert!(!pid.on_target(0.1));
        assert!(pid.on_target(0.5));

        // Clamped to the default output range
        assert_eq!(pid.compute(-5.0, Millis(20)), 1.0);
    }

    #[test]
    fn test_integral_accumulates_every_sample() {
        let mut pid = make_controller(integrating_config());
        pid.set_setpoint(1.0);
        for k in 1..=5 {
            let output = pid.compute(0.0, Millis((k - 1) * 20));
            // ki * Ts = 0.02 per unit error per sample
            assert_relative_eq!(output, 1.0 + 0.02 * k as f64, epsilon = 1e-12);
        }
        assert_eq!(pid.last_time(), Some(Millis(80)));
    }

    #[test]
    fn test_holds_output_within_sample_time() {
        let mut pid = make_controller(integrating_config());
        pid.set_setpoint(1.0);
        let first = pid.compute(0.0, Millis(0));
        assert_relative_eq!(first, 1.02, epsilon = 1e-12);

        // Too early: nothing is recomputed, not even for a different input
        assert_eq!(pid.compute(-3.0, Millis(10)), first);
        assert_eq!(pid.last_time(), Some(Millis(0)));

        assert_relative_eq!(pid.compute(0.0, Millis(20)), 1.04, epsilon = 1e-12);
    }

    #[test]
    fn test_setpoint_change_keeps_integral() {
        let mut pid = make_controller(integrating_config());
        pid.set_setpoint(1.0);
        for k in 0..5 {
            pid.compute(0.0, Millis(k * 20));
        }

        pid.set_setpoint(2.0);
        assert_eq!(pid.setpoint(), 2.0);
        // 0.10 accumulated so far, plus one more sample at unit error
        assert_relative_eq!(pid.compute(1.0, Millis(100)), 1.12, epsilon = 1e-12);

        pid.reset_integral();
        assert_relative_eq!(pid.compute(1.0, Millis(120)), 1.02, epsilon = 1e-12);
    }

    #[test]
    fn test_reenable_is_bumpless() {
        let mut pid = make_controller(integrating_config());
        pid.set_setpoint(1.0);
        for k in 0..5 {
            pid.compute(0.0, Millis(k * 20));
        }
        let held = pid.output();
        assert_relative_eq!(held, 1.10, epsilon = 1e-12);

        pid.disable();
        assert_eq!(pid.compute(5.0, Millis(200)), held);

        // On target after re-enabling: the integral picks up the held output
        pid.set_setpoint(3.0);
        pid.enable();
        assert_relative_eq!(pid.compute(3.0, Millis(220)), held, epsilon = 1e-12);
    }

    #[test]
    fn test_derivative_reacts_to_error_change() {
        let config = PidConfigBuilder::default()
            .kd(0.02)
            .output_limits(-10.0, 10.0)
            .build()
            .unwrap();
        let mut pid = make_controller(config);

        // No derivative kick on the first sample
        assert_relative_eq!(pid.compute(-0.5, Millis(0)), 0.5, epsilon = 1e-12);
        // Error rose by 0.5 over one sample: kd / Ts * 0.5
        assert_relative_eq!(pid.compute(-1.0, Millis(20)), 1.5, epsilon = 1e-12);
        assert_relative_eq!(pid.compute(-1.0, Millis(40)), 1.0, epsilon = 1e-12);
    }
}
