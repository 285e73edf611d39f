// Running arbitrary code on an OS thread as a scheduled task
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

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::task::{Task, TaskState};
use crate::time::InstantLike;

/// Handed to the job so it can poll for a stop request.
#[derive(Clone, Debug)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    /// True once the owner asked the job to stop.
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

type Job = Arc<dyn Fn(StopToken) + Send + Sync>;

/// Runs a closure on its own thread. The only place in the crate where work happens outside
/// the scheduler's tick.
///
/// As a [`Task`], it is finished once the thread exits. Cancelling only requests a stop; the
/// job must poll its [`StopToken`] for that to have any effect.
pub struct BackgroundTask {
    job: Job,
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    state: TaskState,
}

impl BackgroundTask {
    /// Wraps `job`. Nothing runs until the task starts.
    pub fn new(job: impl Fn(StopToken) + Send + Sync + 'static) -> Self {
        Self {
            job: Arc::new(job),
            handle: None,
            stop: Arc::new(AtomicBool::new(false)),
            state: TaskState::Idle,
        }
    }

    /// Spawns a new run of the job. A run that is still alive is left alone.
    pub fn start(&mut self) -> io::Result<()> {
        if self.is_alive() {
            return Ok(());
        }
        self.stop = Arc::new(AtomicBool::new(false));
        let token = StopToken(self.stop.clone());
        let job = self.job.clone();
        self.handle = Some(
            thread::Builder::new()
                .name("background-task".into())
                .spawn(move || job(token))?,
        );
        Ok(())
    }

    /// True while the job's thread is running.
    pub fn is_alive(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// Asks a running job to stop. The job must poll its [`StopToken`].
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }
}

impl<I: InstantLike> Task<I> for BackgroundTask {
    fn on_start(&mut self, _now: I) {
        match self.start() {
            Ok(()) => self.state = TaskState::Running,
            Err(err) => {
                log::error!("failed to spawn background task: {err}");
                self.state = TaskState::Done;
            }
        }
    }

    fn on_tick(&mut self, _now: I) {}

    fn is_finished(&mut self, _now: I) -> bool {
        !self.is_alive()
    }

    fn on_end(&mut self) {
        if !self.state.is_running() {
            return;
        }
        // The thread has exited, so joining does not block.
        if let Some(Err(_)) = self.handle.take().map(JoinHandle::join) {
            log::error!("background task panicked");
        }
        self.state = TaskState::Done;
    }

    fn on_cancel(&mut self) {
        if !self.state.is_running() {
            return;
        }
        self.request_stop();
        self.state = TaskState::Cancelled;
    }

    fn state(&self) -> TaskState {
        self.state
    }
}

impl core::fmt::Debug for BackgroundTask {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BackgroundTask")
            .field("alive", &self.is_alive())
            .field("state", &self.state)
            .finish()
    }
}
