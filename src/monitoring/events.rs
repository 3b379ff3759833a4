/*!
 * Scheduler Events
 * Strongly-typed notifications raised for observers (GUI, logging, orchestration)
 */

use crate::core::types::ProcessId;
use serde::{Deserialize, Serialize};

/// Event raised by the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SchedulerEvent {
    /// Waiting for a worker slot
    ProcessQueued { id: ProcessId },
    /// A run segment was dispatched
    ProcessStarted { id: ProcessId },
    /// Moved out of its slot to the front of the queue
    ProcessPreempted { id: ProcessId },
    /// A run segment ended; the process is still registered
    ProcessCompleted { id: ProcessId },
    /// Destroyed; the registry entry is gone
    ProcessKilled { id: ProcessId },
    /// The step loop returned an error or panicked
    ProcessFailed { id: ProcessId, cause: String },
    /// Worker budget was written
    CapacityChanged { capacity: usize },
}

impl SchedulerEvent {
    /// Process the event refers to, if any
    #[inline]
    pub fn process_id(&self) -> Option<ProcessId> {
        match self {
            SchedulerEvent::ProcessQueued { id }
            | SchedulerEvent::ProcessStarted { id }
            | SchedulerEvent::ProcessPreempted { id }
            | SchedulerEvent::ProcessCompleted { id }
            | SchedulerEvent::ProcessKilled { id }
            | SchedulerEvent::ProcessFailed { id, .. } => Some(*id),
            SchedulerEvent::CapacityChanged { .. } => None,
        }
    }

    /// Short name used as the log message
    pub fn name(&self) -> &'static str {
        match self {
            SchedulerEvent::ProcessQueued { .. } => "process_queued",
            SchedulerEvent::ProcessStarted { .. } => "process_started",
            SchedulerEvent::ProcessPreempted { .. } => "process_preempted",
            SchedulerEvent::ProcessCompleted { .. } => "process_completed",
            SchedulerEvent::ProcessKilled { .. } => "process_killed",
            SchedulerEvent::ProcessFailed { .. } => "process_failed",
            SchedulerEvent::CapacityChanged { .. } => "capacity_changed",
        }
    }
}
