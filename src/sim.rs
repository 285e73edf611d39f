use core::time::Duration;

use nalgebra as na;

use crate::io::{arcade_to_tank, Actuator, Drivetrain, FeedbackSource, SourceMode};
use crate::task::Task;
use crate::time::{Clock, InstantLike, ManualClock};

/// A DC motor with a first-order speed response driving an inertial load.
pub struct DcMotor {
    /// Steady-state speed at full command
    pub gain: f64,
    /// Time constant of the speed response, in seconds
    pub time_constant: f64,
}

impl DcMotor {
    /// Implements the state-space realization of the motor:
    /// ┌     ┐   ┌           ┐┌    ┐   ┌     ┐
    /// │ p'  │ = │  0   1    ││ p  │ + │ 0   │ u
    /// │ p'' │   │  0   -1/τ ││ p' │   │ K/τ │
    /// └     ┘   └           ┘└    ┘   └     ┘
    pub fn f(&self, x: na::Vector2<f64>, u: f64) -> na::Vector2<f64> {
        let inv_tau = 1.0 / self.time_constant;
        let mat_a = na::Matrix2::new(0.0, 1.0, 0.0, -inv_tau);
        let mat_b = na::Vector2::new(0.0, self.gain * inv_tau);

        mat_a * x + mat_b * u
    }
}

/// Fourth-order Runge-Kutta step of `x' = f(x)`.
pub fn rk4_step(
    f: impl Fn(na::Vector2<f64>) -> na::Vector2<f64>,
    x: na::Vector2<f64>,
    dt: f64,
) -> na::Vector2<f64> {
    let k1 = f(x);
    let k2 = f(x + k1 * (dt / 2.0));
    let k3 = f(x + k2 * (dt / 2.0));
    let k4 = f(x + k3 * dt);
    x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
}

/// A single motor-driven joint (arm, lift, flywheel). Acts as its own actuator and encoder.
pub struct Joint {
    motor: DcMotor,
    state: na::Vector2<f64>,
    command: f64,
    mode: SourceMode,
}

impl Joint {
    /// A joint at rest at position zero.
    pub fn new(motor: DcMotor) -> Self {
        Self {
            motor,
            state: na::Vector2::zeros(),
            command: 0.0,
            mode: SourceMode::Position,
        }
    }

    /// Current position.
    pub fn position(&self) -> f64 {
        self.state[0]
    }

    /// Current velocity.
    pub fn velocity(&self) -> f64 {
        self.state[1]
    }

    /// What `read` currently reports.
    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    /// Integrates the joint over `dt` holding the last command.
    pub fn step(&mut self, dt: Duration) {
        let u = self.command;
        self.state = rk4_step(|x| self.motor.f(x, u), self.state, dt.as_secs_f64());
    }
}

impl Actuator for Joint {
    fn write(&mut self, output: f64) {
        self.command = output.clamp(-1.0, 1.0);
    }

    fn output(&self) -> f64 {
        self.command
    }
}

impl FeedbackSource for Joint {
    fn read(&mut self) -> f64 {
        match self.mode {
            SourceMode::Position => self.position(),
            SourceMode::Rate => self.velocity(),
        }
    }

    fn set_mode(&mut self, mode: SourceMode) {
        self.mode = mode;
    }
}

/// A tank drivetrain on the field. Its feedback is the gyro heading in degrees (or yaw rate in
/// rate mode); turning is modelled as a motor whose "position" is the heading.
pub struct SimDrivetrain {
    turning: DcMotor,
    heading: na::Vector2<f64>,
    forward: f64,
    rotate: f64,
    sides: (f64, f64),
    distance: f64,
    top_speed: f64,
    mode: SourceMode,
}

impl SimDrivetrain {
    /// A drivetrain at rest heading zero; `top_speed` is the forward speed at full command.
    pub fn new(turning: DcMotor, top_speed: f64) -> Self {
        Self {
            turning,
            heading: na::Vector2::zeros(),
            forward: 0.0,
            rotate: 0.0,
            sides: (0.0, 0.0),
            distance: 0.0,
            top_speed,
            mode: SourceMode::Position,
        }
    }

    /// Heading in degrees.
    pub fn heading(&self) -> f64 {
        self.heading[0]
    }

    /// Teleports the heading, e.g. to start a test turned.
    pub fn set_heading(&mut self, heading: f64) {
        self.heading[0] = heading;
    }

    /// Distance travelled forward.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Last (left, right) side outputs.
    pub fn sides(&self) -> (f64, f64) {
        self.sides
    }

    /// Integrates the drivetrain over `dt` holding the last command.
    pub fn step(&mut self, dt: Duration) {
        let u = self.rotate;
        self.heading = rk4_step(|x| self.turning.f(x, u), self.heading, dt.as_secs_f64());
        self.distance += self.forward * self.top_speed * dt.as_secs_f64();
    }
}

impl Drivetrain for SimDrivetrain {
    fn arcade_drive(&mut self, forward: f64, rotate: f64) {
        self.sides = arcade_to_tank(forward, rotate);
        self.forward = (self.sides.0 + self.sides.1) / 2.0;
        self.rotate = (self.sides.0 - self.sides.1) / 2.0;
    }
}

impl FeedbackSource for SimDrivetrain {
    fn read(&mut self) -> f64 {
        match self.mode {
            SourceMode::Position => self.heading[0],
            SourceMode::Rate => self.heading[1],
        }
    }

    fn set_mode(&mut self, mode: SourceMode) {
        self.mode = mode;
    }
}

/// Plays the scheduler for `task`: starts it at the clock's current time, then every `period`
/// advances the clock, lets `plant` evolve over the period and runs one tick.
///
/// Returns the instant the task finished, or `None` after cancelling it once `max_ticks`
/// periods have passed.
pub fn run_until_finished<I: InstantLike, T: Task<I>>(
    task: &mut T,
    clock: &ManualClock<I>,
    period: Duration,
    max_ticks: usize,
    mut plant: impl FnMut(Duration),
) -> Option<I> {
    task.on_start(clock.now());
    for _ in 0..max_ticks {
        let now = clock.advance(period);
        plant(period);
        if task.run_tick(now) {
            return Some(now);
        }
    }
    task.on_cancel();
    None
}
