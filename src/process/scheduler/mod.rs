/*!
 * Trial Scheduler
 * Bounded-concurrency scheduler for long-running, steppable processes
 *
 * A caller registers handles, then plays them. Each admitted process occupies
 * one worker slot for one run segment; when a segment returns the slot is
 * handed to the front of the wait queue. All bookkeeping lives in a single
 * [`SchedulerState`] behind one mutex, shared with the completion path.
 */

use crate::monitoring::EventBus;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::warn;

mod atomic_stats;
mod builder;
mod dispatch;
mod operations;
pub mod state;

pub use atomic_stats::{AtomicSchedulerStats, SchedulerStats};
pub use builder::SchedulerBuilder;
pub use state::{SchedulerSnapshot, SchedulerState};

/// Cloneable handle to one scheduler instance
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

/// State shared between callers and in-flight segment tasks
pub(crate) struct Shared {
    state: Mutex<SchedulerState>,
    events: EventBus,
    stats: AtomicSchedulerStats,
    runtime: tokio::runtime::Handle,
    /// Signalled whenever the run set becomes empty
    drained: Notify,
}

impl Shared {
    fn new(capacity: usize, runtime: tokio::runtime::Handle) -> Self {
        Self {
            state: Mutex::new(SchedulerState::new(capacity)),
            events: EventBus::new(),
            stats: AtomicSchedulerStats::new(),
            runtime,
            drained: Notify::new(),
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let registered = self.state.get_mut().registered_len();
        if registered > 0 {
            warn!(
                registered,
                "Scheduler dropped with registered processes - use `scheduler.shutdown().await` for graceful cleanup"
            );
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
