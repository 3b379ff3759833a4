/*!
 * Process Handle Traits
 * Control surface the scheduler drives; implemented by the simulation engine
 */

use crate::core::types::Step;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Status reported by a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleStatus {
    /// Never stepped
    Ready,
    /// Inside `begin_stepping`
    Running,
    /// Suspended, resumable
    Paused,
    /// Stepping ended permanently
    Finished,
}

/// A long-running, steppable unit of work
///
/// Control calls arrive from other threads while `begin_stepping` is executing,
/// so every method takes `&self`.
pub trait ProcessHandle: Send + Sync {
    /// Run steps until paused, stopped or finished. Blocking and possibly CPU-bound.
    fn begin_stepping(&self) -> anyhow::Result<()>;

    /// Suspend as soon as possible
    fn pause(&self);

    /// Suspend once `step` is reached
    fn pause_at(&self, step: Step);

    /// End stepping permanently as soon as possible
    fn stop(&self);

    /// End stepping permanently once `step` is reached
    fn stop_at(&self, step: Step);

    fn current_status(&self) -> HandleStatus;
}

impl<T: ProcessHandle + ?Sized> ProcessHandle for Arc<T> {
    fn begin_stepping(&self) -> anyhow::Result<()> {
        (**self).begin_stepping()
    }

    fn pause(&self) {
        (**self).pause()
    }

    fn pause_at(&self, step: Step) {
        (**self).pause_at(step)
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn stop_at(&self, step: Step) {
        (**self).stop_at(step)
    }

    fn current_status(&self) -> HandleStatus {
        (**self).current_status()
    }
}
