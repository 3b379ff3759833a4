/*!
 * Trial
 * Reference process handle: a step loop with pause/stop controls and step deadlines
 */

use super::traits::{HandleStatus, ProcessHandle};
use crate::core::types::Step;
use anyhow::Context;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Sentinel for "no deadline"
const NO_TARGET: Step = Step::MAX;

type StepFn = Box<dyn Fn(Step) -> anyhow::Result<()> + Send + Sync>;

/// A steppable trial
///
/// Pause and stop requests are observed between steps. A paused trial resumes
/// from its current step the next time it is stepped; a finished trial never
/// steps again.
pub struct Trial {
    name: String,
    max_steps: Option<Step>,
    step_delay: Duration,
    step_fn: StepFn,
    current_step: AtomicU64,
    pause_requested: AtomicBool,
    stop_requested: AtomicBool,
    pause_at: AtomicU64,
    stop_at: AtomicU64,
    status: Mutex<HandleStatus>,
}

impl Trial {
    /// Unbounded trial with a no-op step
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_steps: None,
            step_delay: Duration::ZERO,
            step_fn: Box::new(|_| Ok(())),
            current_step: AtomicU64::new(0),
            pause_requested: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            pause_at: AtomicU64::new(NO_TARGET),
            stop_at: AtomicU64::new(NO_TARGET),
            status: Mutex::new(HandleStatus::Ready),
        }
    }

    /// Finish after `steps` steps
    #[must_use]
    pub fn with_max_steps(mut self, steps: Step) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Sleep between steps
    #[must_use]
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Work performed on each step
    #[must_use]
    pub fn with_step_fn<F>(mut self, step_fn: F) -> Self
    where
        F: Fn(Step) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.step_fn = Box::new(step_fn);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Steps completed so far
    pub fn current_step(&self) -> Step {
        self.current_step.load(Ordering::Acquire)
    }

    fn run_steps(&self) -> anyhow::Result<HandleStatus> {
        loop {
            let step = self.current_step.load(Ordering::Acquire);

            if self.stop_requested.load(Ordering::Acquire)
                || step >= self.stop_at.load(Ordering::Acquire)
            {
                return Ok(HandleStatus::Finished);
            }
            if self.pause_requested.swap(false, Ordering::AcqRel) {
                return Ok(HandleStatus::Paused);
            }
            // A target survives immediate pauses and is consumed only once reached.
            if step >= self.pause_at.load(Ordering::Acquire) {
                self.pause_at.store(NO_TARGET, Ordering::Release);
                return Ok(HandleStatus::Paused);
            }
            if self.max_steps.is_some_and(|max| step >= max) {
                return Ok(HandleStatus::Finished);
            }

            (self.step_fn)(step)
                .with_context(|| format!("trial '{}' failed at step {}", self.name, step))?;
            self.current_step.store(step + 1, Ordering::Release);

            if !self.step_delay.is_zero() {
                std::thread::sleep(self.step_delay);
            }
        }
    }
}

impl ProcessHandle for Trial {
    fn begin_stepping(&self) -> anyhow::Result<()> {
        {
            let mut status = self.status.lock();
            if *status == HandleStatus::Finished {
                return Ok(());
            }
            *status = HandleStatus::Running;
        }

        match self.run_steps() {
            Ok(end) => {
                *self.status.lock() = end;
                Ok(())
            }
            Err(e) => {
                *self.status.lock() = HandleStatus::Finished;
                Err(e)
            }
        }
    }

    fn pause(&self) {
        self.pause_requested.store(true, Ordering::Release);
    }

    fn pause_at(&self, step: Step) {
        self.pause_at.store(step, Ordering::Release);
    }

    fn stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        let mut status = self.status.lock();
        if matches!(*status, HandleStatus::Ready | HandleStatus::Paused) {
            *status = HandleStatus::Finished;
        }
    }

    fn stop_at(&self, step: Step) {
        self.stop_at.store(step, Ordering::Release);
    }

    fn current_status(&self) -> HandleStatus {
        *self.status.lock()
    }
}

impl fmt::Debug for Trial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trial")
            .field("name", &self.name)
            .field("max_steps", &self.max_steps)
            .field("current_step", &self.current_step())
            .field("status", &self.current_status())
            .finish()
    }
}
