/*!
 * Segment Dispatch
 * Runs admitted segments on the blocking pool and reports their completion
 */

use super::state::{Effects, Launch, SchedulerState, SegmentOutcome};
use super::Shared;
use crate::core::types::ProcessId;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, error};

impl Shared {
    /// Run one state transition under the lock, then carry out its effects
    ///
    /// Events are published while the lock is held so observers see them in
    /// state order. Handle controls and segment launches happen after release.
    pub(super) fn transact<R>(
        self: &Arc<Self>,
        f: impl FnOnce(&mut SchedulerState, &mut Effects) -> R,
    ) -> R {
        let mut fx = Effects::new();
        let result = {
            let mut state = self.state.lock();
            let result = f(&mut state, &mut fx);
            debug_assert!(state.check_invariants().is_ok(), "{:?}", state.check_invariants());

            for event in &fx.events {
                self.stats.record(event);
                self.events.publish(event);
            }
            if state.running_len() == 0 {
                self.drained.notify_waiters();
            }
            result
        };

        for (handle, control) in fx.controls {
            control.apply(handle.as_ref());
        }
        for launch in fx.launches {
            self.launch(launch);
        }
        result
    }

    /// Step the handle on the blocking pool; never called with the state lock held
    fn launch(self: &Arc<Self>, launch: Launch) {
        let shared = Arc::clone(self);
        let Launch { id, handle } = launch;

        self.runtime.spawn(async move {
            let joined = tokio::task::spawn_blocking(move || handle.begin_stepping()).await;

            let outcome = match joined {
                Ok(Ok(())) => SegmentOutcome::Returned,
                Ok(Err(e)) => SegmentOutcome::Failed(format!("{:#}", e)),
                Err(e) if e.is_panic() => {
                    SegmentOutcome::Failed(panic_message(e.into_panic().as_ref()))
                }
                Err(e) => {
                    error!(id, error = %e, "segment task did not complete");
                    SegmentOutcome::Failed(e.to_string())
                }
            };

            shared.segment_returned(id, outcome);
        });
    }

    fn segment_returned(self: &Arc<Self>, id: ProcessId, outcome: SegmentOutcome) {
        debug!(id, ?outcome, "run segment returned");
        self.transact(|state, fx| state.finish_segment(id, outcome, fx));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
