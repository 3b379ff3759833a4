/*!
 * Process Types
 * Registered process records and their admission state
 */

use super::traits::{HandleStatus, ProcessHandle};
use crate::core::types::ProcessId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where a process sits in the admission pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionState {
    /// Registered, not waiting and not holding a slot
    Idle,
    /// Waiting in the admission queue
    Queued,
    /// Holding a worker slot
    Running,
}

/// A registered process, owned by the scheduler
pub struct Process {
    pub id: ProcessId,
    pub handle: Arc<dyn ProcessHandle>,
    pub admission: AdmissionState,
    /// A run segment was dispatched and has not reported back
    pub(crate) in_flight: bool,
    /// Re-admitted while the previous segment was still in flight
    pub(crate) relaunch_pending: bool,
    /// Run segments that have reported back
    pub(crate) segments_completed: u64,
}

impl Process {
    #[inline]
    #[must_use]
    pub fn new(id: ProcessId, handle: Arc<dyn ProcessHandle>) -> Self {
        Self {
            id,
            handle,
            admission: AdmissionState::Idle,
            in_flight: false,
            relaunch_pending: false,
            segments_completed: 0,
        }
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.admission, AdmissionState::Running)
    }

    #[inline]
    pub fn segments_completed(&self) -> u64 {
        self.segments_completed
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("id", &self.id)
            .field("admission", &self.admission)
            .field("in_flight", &self.in_flight)
            .field("relaunch_pending", &self.relaunch_pending)
            .field("segments_completed", &self.segments_completed)
            .finish()
    }
}

/// Point-in-time view of one process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub id: ProcessId,
    pub admission: AdmissionState,
    pub kill_pending: bool,
    pub handle_status: HandleStatus,
    pub segments_completed: u64,
}
