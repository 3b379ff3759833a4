/*!
 * Simulation Trial Scheduler Library
 * Bounded-concurrency scheduling of long-running, steppable simulation trials
 */

pub mod core;
pub mod monitoring;
pub mod process;

// Re-exports
pub use crate::core::{ProcessId, SchedulerConfig, SchedulerError, SchedulerResult, Step};
pub use monitoring::{init_tracing, EventBus, SchedulerEvent};
pub use process::{
    AdmissionState, HandleStatus, ProcessHandle, ProcessInfo, ProcessRegistry, Scheduler,
    SchedulerBuilder, SchedulerSnapshot, SchedulerStats, Trial,
};
