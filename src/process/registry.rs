/*!
 * Process Registry
 * Single source of truth for which process ids exist
 */

use super::traits::ProcessHandle;
use super::types::Process;
use crate::core::errors::SchedulerError;
use crate::core::types::{ProcessId, SchedulerResult};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Maps ids to processes
///
/// Ids come from a high-water mark and are never reused, even after removal.
/// Iteration is in ascending id order.
#[derive(Debug)]
pub struct ProcessRegistry {
    processes: BTreeMap<ProcessId, Process>,
    next_id: ProcessId,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self {
            processes: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Store a handle under a fresh id
    pub fn register(&mut self, handle: Arc<dyn ProcessHandle>) -> ProcessId {
        let id = self.next_id;
        self.next_id += 1;
        self.processes.insert(id, Process::new(id, handle));
        id
    }

    /// Store handles under contiguous fresh ids, in input order
    pub fn register_batch<I>(&mut self, handles: I) -> Vec<ProcessId>
    where
        I: IntoIterator<Item = Arc<dyn ProcessHandle>>,
    {
        handles.into_iter().map(|h| self.register(h)).collect()
    }

    #[inline]
    pub fn exists(&self, id: ProcessId) -> bool {
        self.processes.contains_key(&id)
    }

    pub fn get(&self, id: ProcessId) -> SchedulerResult<&Process> {
        self.processes.get(&id).ok_or(SchedulerError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: ProcessId) -> SchedulerResult<&mut Process> {
        self.processes
            .get_mut(&id)
            .ok_or(SchedulerError::NotFound(id))
    }

    pub fn remove(&mut self, id: ProcessId) -> SchedulerResult<Process> {
        self.processes
            .remove(&id)
            .ok_or(SchedulerError::NotFound(id))
    }

    /// Registered ids in ascending order
    pub fn ids(&self) -> Vec<ProcessId> {
        self.processes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}
