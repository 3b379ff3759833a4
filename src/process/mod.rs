/*!
 * Process Module
 * Process handles, registration, and scheduling
 */

pub mod registry;
pub mod scheduler;
pub mod traits;
pub mod trial;
pub mod types;

// Re-export for convenience
pub use registry::ProcessRegistry;
pub use scheduler::{Scheduler, SchedulerBuilder, SchedulerSnapshot, SchedulerStats};
pub use traits::{HandleStatus, ProcessHandle};
pub use trial::Trial;
pub use types::{AdmissionState, Process, ProcessInfo};
