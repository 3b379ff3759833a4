/*!
 * Core Types
 * Common types used across the scheduler
 */

/// Process identifier, allocated monotonically and never reused
pub type ProcessId = u64;

/// Step count in a process's own stepping domain
pub type Step = u64;

/// Common result type for scheduler operations
pub type SchedulerResult<T> = Result<T, super::errors::SchedulerError>;
