#![warn(missing_docs)]

//! # Settling PID Motion Tasks
//!
//! Closed-loop motion tasks for competition robots run by a fixed-period cooperative scheduler.
//!
//! Every task wraps a PID loop with a "reached and held" termination rule: the task is done once
//! the error has stayed within a tolerance for a settle time, rather than the first time the
//! error crosses the tolerance.
//!
//! ## Features
//!
//! - One state machine, [`motion::SettlingMotionTask`], specialized by an output stage and a
//!   [`motion::MotionKind`]:
//!   - **Position hold**: drive an actuator to a setpoint, done once settled.
//!   - **Rate hold**: hold a speed by integrating the loop output, never done by itself.
//!   - **Arcade orient**: steer a drivetrain while driving forward, done on a timeout or an extra
//!     predicate.
//!   - **Heading hold**: turn in place, done once settled or on a timeout. Targets can be given
//!     relative to a reference frame captured once at construction.
//! - Setpoints are re-read every tick and pushed into the controller only when they change.
//! - A fresh PID controller per run, so no integral state leaks between runs.
//! - Cleanup (controller dropped, mechanism in neutral) runs exactly once, whether the task ends
//!   or is cancelled.
//! - `no_std` + `alloc`; the `std` feature adds `thiserror` errors, a wall clock and
//!   [`background::BackgroundTask`].
//!
//! ## Usage
//!
//! ```rust
//! use core::time::Duration;
//!
//! use settling_pid::io::{Actuator, FeedbackSource, SourceMode};
//! use settling_pid::motion::PositionHoldTask;
//! use settling_pid::settings::PidSettings;
//! use settling_pid::task::Task;
//! use settling_pid::time::Millis;
//!
//! #[derive(Default)]
//! struct Lift {
//!     output: f64,
//!     height: f64,
//! }
//!
//! impl Actuator for Lift {
//!     fn write(&mut self, output: f64) {
//!         self.output = output;
//!     }
//!
//!     fn output(&self) -> f64 {
//!         self.output
//!     }
//! }
//!
//! struct Encoder(f64);
//!
//! impl FeedbackSource for Encoder {
//!     fn read(&mut self) -> f64 {
//!         self.0
//!     }
//!
//!     fn set_mode(&mut self, _mode: SourceMode) {}
//! }
//!
//! let settings = PidSettings::builder()
//!     .kp(0.8)
//!     .tolerance(0.05)
//!     .wait_time(Duration::from_millis(200))
//!     .build()
//!     .expect("Invalid PID settings");
//!
//! let mut task = PositionHoldTask::position_hold(Lift::default(), Encoder(1.0), 1.0, settings)
//!     .expect("Invalid task");
//!
//! task.on_start(Millis(0));
//! let mut now = Millis(0);
//! while !task.run_tick(now) {
//!     now = now + Duration::from_millis(20);
//! }
//! assert_eq!(now, Millis(200));
//! assert_eq!(task.actuator().output(), 0.0);
//! ```
//!
//! ### Plugging in your Instant type
//!
//! Tasks are generic over [`time::InstantLike`]; `Millis`, `TimeF64` and (with `std`)
//! `StdInstant` are provided.
#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

/// The PID runtime controller and its configuration
pub mod pid;

/// Time-like objects and clocks
pub mod time;

/// Gains and termination thresholds of motion tasks
pub mod settings;

/// Debounce of the on-target signal
pub mod settle;

/// Capabilities of sensors, actuators and drivetrains
pub mod io;

/// Setpoints and suppliers re-evaluated every tick
pub mod setpoint;

/// How loop outputs reach mechanisms
pub mod output;

/// PID loop between a feedback source and an output stage
pub mod pid_loop;

/// Scheduler contract
pub mod task;

/// Settling motion tasks
pub mod motion;

/// Moves that end at a held limit
pub mod limit;

/// Work run on its own thread as a task
#[cfg(feature = "std")]
pub mod background;

#[doc(hidden)]
#[cfg(feature = "simulation")]
pub mod sim;
