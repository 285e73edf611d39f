//! Turn-in-place of a simulated tank drivetrain under a heading-hold task
//! This example requires the `--features simulation` flag to be enabled.
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
pub fn main() {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use settling_pid::motion::DriveTask;
    use settling_pid::settings::PidSettings;
    use settling_pid::sim::{DcMotor, SimDrivetrain};
    use settling_pid::task::Task;
    use settling_pid::time::{Clock, ManualClock, Millis};

    const PERIOD: Duration = Duration::from_millis(20);
    const MAX_TICKS: usize = 500;

    let turning = DcMotor {
        gain: 180.0,
        time_constant: 0.1,
    };
    let drivetrain = Rc::new(RefCell::new(SimDrivetrain::new(turning, 2.0)));
    drivetrain.borrow_mut().set_heading(-45.0);

    let settings = PidSettings::builder()
        .kp(0.015)
        .ki(0.002)
        .tolerance(1.0)
        .wait_time(Duration::from_millis(250))
        .build()
        .unwrap();

    // 90 degrees to the left of wherever the robot points now
    let mut task =
        DriveTask::heading_hold_from_frame(drivetrain.clone(), drivetrain.clone(), 90.0, settings)
            .unwrap()
            .with_timeout(Duration::from_secs(4));

    let clock = ManualClock::new(Millis(0));
    task.on_start(clock.now());

    println!("time_s,heading_deg,left,right");
    for _ in 0..MAX_TICKS {
        let now = clock.advance(PERIOD);
        drivetrain.borrow_mut().step(PERIOD);
        let finished = task.run_tick(now);

        let (left, right) = drivetrain.borrow().sides();
        println!(
            "{:.2},{:.3},{:.3},{:.3}",
            now.0 as f64 / 1000.0,
            drivetrain.borrow().heading(),
            left,
            right
        );
        if finished {
            eprintln!("finished at {now:?} with error {:.3}", task.error());
            return;
        }
    }
    task.on_cancel();
    eprintln!("gave up after {MAX_TICKS} ticks");
}

#[cfg(not(feature = "simulation"))]
fn main() {
    eprintln!("This example requires `--features simulation` to run.");
}
