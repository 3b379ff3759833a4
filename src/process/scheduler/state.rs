/*!
 * Scheduler State
 * Admission bookkeeping: registry, run set, wait queue and deferred kills
 *
 * Every method here is pure bookkeeping. Anything that touches a handle or an
 * observer is recorded in [`Effects`] and carried out by the caller once the
 * state lock has been released.
 */

use crate::core::types::{ProcessId, SchedulerResult, Step};
use crate::monitoring::SchedulerEvent;
use crate::process::registry::ProcessRegistry;
use crate::process::traits::ProcessHandle;
use crate::process::types::{AdmissionState, Process, ProcessInfo};
use ahash::HashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Control request forwarded to a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Pause,
    PauseAt(Step),
    Stop,
    StopAt(Step),
}

impl Control {
    pub fn apply(self, handle: &dyn ProcessHandle) {
        match self {
            Control::Pause => handle.pause(),
            Control::PauseAt(step) => handle.pause_at(step),
            Control::Stop => handle.stop(),
            Control::StopAt(step) => handle.stop_at(step),
        }
    }
}

/// A run segment to dispatch
pub struct Launch {
    pub id: ProcessId,
    pub handle: Arc<dyn ProcessHandle>,
}

/// How a run segment ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    Returned,
    Failed(String),
}

/// Side effects produced by a state transition
#[derive(Default)]
pub struct Effects {
    pub events: Vec<SchedulerEvent>,
    pub launches: Vec<Launch>,
    pub controls: Vec<(Arc<dyn ProcessHandle>, Control)>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.launches.is_empty() && self.controls.is_empty()
    }
}

/// Point-in-time view of the admission structures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerSnapshot {
    pub capacity: usize,
    /// In admission order
    pub running: Vec<ProcessId>,
    /// Front of the queue first
    pub queued: Vec<ProcessId>,
    /// Ascending
    pub kill_pending: Vec<ProcessId>,
}

/// All mutable scheduler state, guarded as one unit
#[derive(Debug)]
pub struct SchedulerState {
    registry: ProcessRegistry,
    running: Vec<ProcessId>,
    queued: VecDeque<ProcessId>,
    kill_pending: HashSet<ProcessId>,
    capacity: usize,
}

impl SchedulerState {
    pub fn new(capacity: usize) -> Self {
        Self {
            registry: ProcessRegistry::new(),
            running: Vec::new(),
            queued: VecDeque::new(),
            kill_pending: HashSet::default(),
            capacity,
        }
    }

    pub fn register(&mut self, handle: Arc<dyn ProcessHandle>) -> ProcessId {
        self.registry.register(handle)
    }

    pub fn register_batch<I>(&mut self, handles: I) -> Vec<ProcessId>
    where
        I: IntoIterator<Item = Arc<dyn ProcessHandle>>,
    {
        self.registry.register_batch(handles)
    }

    /// Admit `id` if a slot is free, otherwise append it to the queue
    pub fn play(&mut self, id: ProcessId, fx: &mut Effects) -> SchedulerResult<()> {
        let process = self.registry.get_mut(id)?;
        if process.admission != AdmissionState::Idle {
            debug!(id, admission = ?process.admission, "play ignored");
            return Ok(());
        }

        if self.running.len() < self.capacity {
            self.admit(id, fx);
        } else {
            process.admission = AdmissionState::Queued;
            self.queued.push_back(id);
            fx.events.push(SchedulerEvent::ProcessQueued { id });
        }
        Ok(())
    }

    /// Play every id in order; unknown ids are skipped and the first one reported
    pub fn play_all(&mut self, ids: &[ProcessId], fx: &mut Effects) -> SchedulerResult<()> {
        let mut first_error = None;
        for &id in ids {
            if let Err(e) = self.play(id, fx) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Forward a control to a running process; silent no-op otherwise
    pub fn control(
        &mut self,
        id: ProcessId,
        control: Control,
        fx: &mut Effects,
    ) -> SchedulerResult<()> {
        let process = self.registry.get_mut(id)?;
        if !process.is_running() {
            debug!(id, ?control, admission = ?process.admission, "control ignored");
            return Ok(());
        }

        // A deferred relaunch is dropped only by an immediate pause or stop; a
        // step target needs that relaunch to reach it.
        if matches!(control, Control::Pause | Control::Stop) {
            process.relaunch_pending = false;
        }
        fx.controls.push((Arc::clone(&process.handle), control));
        Ok(())
    }

    /// Write the worker budget, preempting or admitting to match it
    pub fn set_capacity(&mut self, capacity: usize, fx: &mut Effects) {
        self.capacity = capacity;
        fx.events.push(SchedulerEvent::CapacityChanged { capacity });

        if self.running.len() > capacity {
            let excess = self.running.len() - capacity;
            let preempted: Vec<ProcessId> = self.running.drain(..excess).collect();

            for &id in preempted.iter().rev() {
                self.queued.push_front(id);
            }
            for id in preempted {
                if let Ok(process) = self.registry.get_mut(id) {
                    process.admission = AdmissionState::Queued;
                    if process.relaunch_pending {
                        process.relaunch_pending = false;
                    } else {
                        fx.controls.push((Arc::clone(&process.handle), Control::Pause));
                    }
                }
                fx.events.push(SchedulerEvent::ProcessPreempted { id });
            }
        }

        self.admit_waiting(fx);
    }

    /// Destroy now, or once the current run segment returns if running
    pub fn kill(&mut self, id: ProcessId, fx: &mut Effects) -> SchedulerResult<()> {
        let process = self.registry.get(id)?;
        if process.is_running() {
            if self.kill_pending.insert(id) {
                debug!(id, "kill deferred until run segment returns");
            }
            return Ok(());
        }

        self.destroy(id, fx);
        Ok(())
    }

    pub fn kill_all(&mut self, fx: &mut Effects) {
        for id in self.registry.ids() {
            // Every id came from the registry, so NotFound cannot occur.
            let _ = self.kill(id, fx);
        }
    }

    /// Bookkeeping for a run segment that reported back
    pub fn finish_segment(&mut self, id: ProcessId, outcome: SegmentOutcome, fx: &mut Effects) {
        let Ok(process) = self.registry.get_mut(id) else {
            debug!(id, "segment returned for a destroyed process");
            return;
        };

        process.in_flight = false;
        process.segments_completed += 1;

        let failed = match outcome {
            SegmentOutcome::Returned => false,
            SegmentOutcome::Failed(cause) => {
                fx.events.push(SchedulerEvent::ProcessFailed { id, cause });
                true
            }
        };

        let kill = self.kill_pending.contains(&id);
        if !kill {
            fx.events.push(SchedulerEvent::ProcessCompleted { id });
        }
        let relaunch = std::mem::take(&mut process.relaunch_pending);

        if relaunch && !failed && !kill {
            Self::launch(process, fx);
            return;
        }

        match process.admission {
            AdmissionState::Running => {
                process.admission = AdmissionState::Idle;
                remove_value(&mut self.running, id);
            }
            AdmissionState::Queued if failed => {
                process.admission = AdmissionState::Idle;
                remove_queued(&mut self.queued, id);
            }
            AdmissionState::Queued | AdmissionState::Idle => {}
        }

        if kill {
            self.destroy(id, fx);
        }

        self.admit_waiting(fx);
    }

    /// Admit from the queue front while slots are free
    fn admit_waiting(&mut self, fx: &mut Effects) {
        while self.running.len() < self.capacity {
            let Some(id) = self.queued.pop_front() else {
                break;
            };
            self.admit(id, fx);
        }
    }

    fn admit(&mut self, id: ProcessId, fx: &mut Effects) {
        let Ok(process) = self.registry.get_mut(id) else {
            return;
        };

        process.admission = AdmissionState::Running;
        self.running.push(id);

        if process.in_flight {
            debug!(id, "admitted while previous segment drains; relaunch deferred");
            process.relaunch_pending = true;
        } else {
            Self::launch(process, fx);
        }
    }

    fn launch(process: &mut Process, fx: &mut Effects) {
        process.in_flight = true;
        fx.launches.push(Launch {
            id: process.id,
            handle: Arc::clone(&process.handle),
        });
        fx.events.push(SchedulerEvent::ProcessStarted { id: process.id });
    }

    fn destroy(&mut self, id: ProcessId, fx: &mut Effects) {
        if self.registry.remove(id).is_err() {
            return;
        }
        self.kill_pending.remove(&id);
        remove_value(&mut self.running, id);
        remove_queued(&mut self.queued, id);
        fx.events.push(SchedulerEvent::ProcessKilled { id });
    }

    pub fn exists(&self, id: ProcessId) -> bool {
        self.registry.exists(id)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn running_len(&self) -> usize {
        self.running.len()
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub fn registered_len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_kill_pending(&self, id: ProcessId) -> bool {
        self.kill_pending.contains(&id)
    }

    pub fn info(&self, id: ProcessId) -> SchedulerResult<ProcessInfo> {
        let process = self.registry.get(id)?;
        Ok(ProcessInfo {
            id,
            admission: process.admission,
            kill_pending: self.kill_pending.contains(&id),
            handle_status: process.handle.current_status(),
            segments_completed: process.segments_completed(),
        })
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        let mut kill_pending: Vec<ProcessId> = self.kill_pending.iter().copied().collect();
        kill_pending.sort_unstable();
        SchedulerSnapshot {
            capacity: self.capacity,
            running: self.running.clone(),
            queued: self.queued.iter().copied().collect(),
            kill_pending,
        }
    }

    /// Structural invariants; used by tests and debug assertions
    pub fn check_invariants(&self) -> Result<(), String> {
        let violation = |msg: String| -> Result<(), String> { Err(msg) };

        if self.running.len() > self.capacity {
            return violation(format!(
                "running {} exceeds capacity {}",
                self.running.len(),
                self.capacity
            ));
        }
        for &id in &self.running {
            if self.queued.contains(&id) {
                return violation(format!("{} is both running and queued", id));
            }
            if self.running.iter().filter(|&&r| r == id).count() > 1 {
                return violation(format!("{} admitted twice", id));
            }
        }
        for &id in self.running.iter().chain(&self.queued).chain(&self.kill_pending) {
            if !self.registry.exists(id) {
                return violation(format!("{} referenced but not registered", id));
            }
        }
        Ok(())
    }
}

/// Remove the entry equal to `id`, never by position derived from the id itself
fn remove_value(list: &mut Vec<ProcessId>, id: ProcessId) {
    if let Some(pos) = list.iter().position(|&x| x == id) {
        list.remove(pos);
    }
}

fn remove_queued(queue: &mut VecDeque<ProcessId>, id: ProcessId) {
    if let Some(pos) = queue.iter().position(|&q| q == id) {
        queue.remove(pos);
    }
}
