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


#[cfg(feature = "simulation")]
mod test_closed_loop {

    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use approx::assert_relative_eq;
    use settling_pid::io::Actuator;
    use settling_pid::motion::{DriveTask, PositionHoldTask, RateHoldTask};
    use settling_pid::setpoint::DonePredicate;
    use settling_pid::settings::PidSettings;
    use settling_pid::sim::{run_until_finished, DcMotor, Joint, SimDrivetrain};
    use settling_pid::time::{ManualClock, Millis};

    const PERIOD: Duration = Duration::from_millis(20);

    fn make_joint() -> Rc<RefCell<Joint>> {
        Rc::new(RefCell::new(Joint::new(DcMotor {
            gain: 2.0,
            time_constant: 0.1,
        })))
    }

    fn make_drivetrain() -> Rc<RefCell<SimDrivetrain>> {
        let turning = DcMotor {
            gain: 180.0,
            time_constant: 0.1,
        };
        Rc::new(RefCell::new(SimDrivetrain::new(turning, 2.0)))
    }

    fn settings(kp: f64, tolerance: f64, wait_time: Duration) -> PidSettings {
        PidSettings::builder()
            .kp(kp)
            .tolerance(tolerance)
            .wait_time(wait_time)
            .build()
            .unwrap()
    }

    #[test]
    fn test_position_hold_settles_joint() {
        let joint = make_joint();
        let mut task = PositionHoldTask::position_hold(
            joint.clone(),
            joint.clone(),
            1.0,
            settings(2.0, 0.02, Duration::from_millis(200)),
        )
        .unwrap();

        let clock = ManualClock::new(Millis(0));
        let finished_at = run_until_finished(&mut task, &clock, PERIOD, 500, |dt| {
            joint.borrow_mut().step(dt)
        });

        let finished_at = finished_at.expect("joint never settled");
        assert!(finished_at >= Millis(200));
        assert!(finished_at < Millis(3000));
        assert_relative_eq!(joint.borrow().position(), 1.0, epsilon = 0.02);
        assert_eq!(joint.borrow().output(), 0.0);
    }

    #[test]
    fn test_rate_hold_reaches_speed_until_cancelled() {
        let joint = make_joint();
        let mut task = RateHoldTask::rate_hold(
            joint.clone(),
            joint.clone(),
            1.0,
            settings(1.0, 0.01, Duration::ZERO),
            0.05,
        )
        .unwrap();

        let clock = ManualClock::new(Millis(0));
        let finished_at = run_until_finished(&mut task, &clock, PERIOD, 250, |dt| {
            joint.borrow_mut().step(dt)
        });

        // Rate hold only ends by cancellation
        assert_eq!(finished_at, None);
        assert_relative_eq!(joint.borrow().velocity(), 1.0, epsilon = 0.01);
        assert_eq!(joint.borrow().output(), 0.0);
    }

    #[test]
    fn test_heading_hold_turns_in_place() {
        let drivetrain = make_drivetrain();
        let mut task = DriveTask::heading_hold(
            drivetrain.clone(),
            drivetrain.clone(),
            90.0,
            settings(0.02, 1.0, Duration::from_millis(200)),
        )
        .unwrap()
        .with_timeout(Duration::from_secs(5));

        let clock = ManualClock::new(Millis(0));
        let finished_at = run_until_finished(&mut task, &clock, PERIOD, 500, |dt| {
            drivetrain.borrow_mut().step(dt)
        });

        let finished_at = finished_at.expect("heading hold never finished");
        assert!(finished_at < Millis(5000), "timed out instead of settling");
        assert_relative_eq!(drivetrain.borrow().heading(), 90.0, epsilon = 1.0);
        assert_relative_eq!(drivetrain.borrow().distance(), 0.0);
    }

    #[test]
    fn test_heading_hold_from_frame() {
        let drivetrain = make_drivetrain();
        drivetrain.borrow_mut().set_heading(30.0);
        let mut task = DriveTask::heading_hold_from_frame(
            drivetrain.clone(),
            drivetrain.clone(),
            90.0,
            settings(0.02, 1.0, Duration::from_millis(200)),
        )
        .unwrap()
        .with_timeout(Duration::from_secs(5));

        let clock = ManualClock::new(Millis(0));
        let finished_at = run_until_finished(&mut task, &clock, PERIOD, 500, |dt| {
            drivetrain.borrow_mut().step(dt)
        });

        assert!(finished_at.is_some_and(|t| t < Millis(5000)));
        assert_relative_eq!(drivetrain.borrow().heading(), 60.0, epsilon = 1.0);
    }

    #[test]
    fn test_arcade_orient_drives_until_distance() {
        let drivetrain = make_drivetrain();
        let odometer = drivetrain.clone();
        let mut task = DriveTask::arcade_orient(
            drivetrain.clone(),
            drivetrain.clone(),
            20.0,
            0.5,
            DonePredicate::dynamic(move || odometer.borrow().distance() >= 1.0),
            settings(0.02, 1.0, Duration::ZERO),
        )
        .unwrap()
        .with_timeout(Duration::from_secs(10));

        let clock = ManualClock::new(Millis(0));
        let finished_at = run_until_finished(&mut task, &clock, PERIOD, 1000, |dt| {
            drivetrain.borrow_mut().step(dt)
        });

        // 0.5 * 2 m/s covers a meter in about one second
        let finished_at = finished_at.expect("arcade orient never finished");
        assert!(finished_at >= Millis(980) && finished_at <= Millis(1060));
        assert!(drivetrain.borrow().distance() >= 1.0);
        assert!(drivetrain.borrow().heading() > 10.0);
    }
}
