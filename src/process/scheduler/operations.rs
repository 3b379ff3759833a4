/*!
 * Scheduler Operations
 * Registration, admission, control, capacity and termination
 */

use super::atomic_stats::SchedulerStats;
use super::builder::SchedulerBuilder;
use super::state::{Control, SchedulerSnapshot};
use super::Scheduler;
use crate::core::types::{ProcessId, SchedulerResult, Step};
use crate::monitoring::SchedulerEvent;
use crate::process::traits::ProcessHandle;
use crate::process::types::ProcessInfo;
use std::sync::Arc;
use tracing::{debug, info};

impl Scheduler {
    /// Scheduler on the ambient tokio runtime, sized to hardware parallelism
    pub fn new() -> SchedulerResult<Self> {
        SchedulerBuilder::new().build()
    }

    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Hand a process over to the scheduler; it starts out idle
    pub fn register<H>(&self, handle: H) -> ProcessId
    where
        H: ProcessHandle + 'static,
    {
        let handle: Arc<dyn ProcessHandle> = Arc::new(handle);
        let id = self.shared.transact(|state, _| state.register(handle));
        debug!(id, "process registered");
        id
    }

    /// Register a cohort under contiguous ids, in input order
    pub fn register_batch<H, I>(&self, handles: I) -> Vec<ProcessId>
    where
        H: ProcessHandle + 'static,
        I: IntoIterator<Item = H>,
    {
        let handles: Vec<Arc<dyn ProcessHandle>> = handles
            .into_iter()
            .map(|h| Arc::new(h) as Arc<dyn ProcessHandle>)
            .collect();
        let ids = self.shared.transact(|state, _| state.register_batch(handles));
        debug!(count = ids.len(), "process batch registered");
        ids
    }

    pub fn register_and_play<H>(&self, handle: H) -> ProcessId
    where
        H: ProcessHandle + 'static,
    {
        let handle: Arc<dyn ProcessHandle> = Arc::new(handle);
        self.shared.transact(|state, fx| {
            let id = state.register(handle);
            // Freshly registered, so play cannot miss.
            let _ = state.play(id, fx);
            id
        })
    }

    pub fn register_batch_and_play<H, I>(&self, handles: I) -> Vec<ProcessId>
    where
        H: ProcessHandle + 'static,
        I: IntoIterator<Item = H>,
    {
        let handles: Vec<Arc<dyn ProcessHandle>> = handles
            .into_iter()
            .map(|h| Arc::new(h) as Arc<dyn ProcessHandle>)
            .collect();
        self.shared.transact(|state, fx| {
            let ids = state.register_batch(handles);
            let _ = state.play_all(&ids, fx);
            ids
        })
    }

    pub fn exists(&self, id: ProcessId) -> bool {
        self.shared.state.lock().exists(id)
    }

    // ------------------------------------------------------------------
    // Admission
    // ------------------------------------------------------------------

    /// Admit now if a slot is free, else queue; no-op if already running or queued
    pub fn play(&self, id: ProcessId) -> SchedulerResult<()> {
        self.shared.transact(|state, fx| state.play(id, fx))
    }

    /// Play each id in order; ids that do not fit are queued in input order
    ///
    /// Unknown ids are skipped; the first one is returned as `NotFound` after
    /// the rest have been played.
    pub fn play_all(&self, ids: &[ProcessId]) -> SchedulerResult<()> {
        self.shared.transact(|state, fx| state.play_all(ids, fx))
    }

    // ------------------------------------------------------------------
    // Control (running processes only; silent no-op otherwise)
    // ------------------------------------------------------------------

    pub fn pause(&self, id: ProcessId) -> SchedulerResult<()> {
        self.control(id, Control::Pause)
    }

    /// Ask the process to suspend once it reaches `step`
    pub fn pause_at(&self, id: ProcessId, step: Step) -> SchedulerResult<()> {
        self.control(id, Control::PauseAt(step))
    }

    pub fn stop(&self, id: ProcessId) -> SchedulerResult<()> {
        self.control(id, Control::Stop)
    }

    /// Ask the process to end stepping permanently once it reaches `step`
    pub fn stop_at(&self, id: ProcessId, step: Step) -> SchedulerResult<()> {
        self.control(id, Control::StopAt(step))
    }

    fn control(&self, id: ProcessId, control: Control) -> SchedulerResult<()> {
        self.shared
            .transact(|state, fx| state.control(id, control, fx))
    }

    // ------------------------------------------------------------------
    // Capacity
    // ------------------------------------------------------------------

    /// Resize the worker budget
    ///
    /// Growing admits from the queue front. Shrinking pauses the oldest
    /// admissions and puts them back at the queue front in their original order.
    pub fn set_capacity(&self, capacity: usize) {
        self.shared
            .transact(|state, fx| state.set_capacity(capacity, fx));
    }

    pub fn capacity(&self) -> usize {
        self.shared.state.lock().capacity()
    }

    // ------------------------------------------------------------------
    // Termination
    // ------------------------------------------------------------------

    /// Destroy a process; deferred to the end of its run segment if running
    pub fn kill(&self, id: ProcessId) -> SchedulerResult<()> {
        self.shared.transact(|state, fx| state.kill(id, fx))
    }

    pub fn kill_all(&self) {
        self.shared.transact(|state, fx| state.kill_all(fx));
    }

    /// Stop every running process, kill everything, and wait for the run set to drain
    pub async fn shutdown(&self) {
        info!("Scheduler shutting down");

        self.shared.transact(|state, fx| {
            for id in state.snapshot().running {
                let _ = state.control(id, Control::Stop, fx);
            }
            state.kill_all(fx);
        });

        loop {
            let drained = self.shared.drained.notified();
            tokio::pin!(drained);
            drained.as_mut().enable();

            if self.shared.state.lock().running_len() == 0 {
                break;
            }
            drained.await;
        }

        info!("Scheduler shutdown complete");
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Receive every event published from now on
    pub fn subscribe(&self) -> flume::Receiver<SchedulerEvent> {
        self.shared.events.subscribe()
    }

    pub fn status(&self, id: ProcessId) -> SchedulerResult<ProcessInfo> {
        self.shared.state.lock().info(id)
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        self.shared.state.lock().snapshot()
    }

    pub fn stats(&self) -> SchedulerStats {
        let mut stats = self.shared.stats.snapshot();
        let state = self.shared.state.lock();
        stats.capacity = state.capacity();
        stats.running_now = state.running_len();
        stats.queued_now = state.queued_len();
        stats.registered_now = state.registered_len();
        stats
    }
}
