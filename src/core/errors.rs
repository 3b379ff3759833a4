/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::ProcessId;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheduler-related errors with serialization support
///
/// Admission mismatches (pausing a queued process, playing a running one) are
/// silent no-ops and never surface here.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Process {0} not found")]
    #[diagnostic(
        code(scheduler::not_found),
        help("The process may have been killed or never registered. Check the id.")
    )]
    NotFound(ProcessId),

    #[error("No async runtime available: {0}")]
    #[diagnostic(
        code(scheduler::runtime_unavailable),
        help("Build the scheduler inside a tokio runtime or pass a runtime handle to the builder.")
    )]
    RuntimeUnavailable(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(scheduler::invalid_config),
        help("Check the SIM_* environment variables.")
    )]
    InvalidConfig(String),
}

impl SchedulerError {
    /// Whether the error refers to a missing process
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, SchedulerError::NotFound(_))
    }
}
