/*!
 * Core Module
 * Shared types, errors, limits and configuration
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod types;

pub use config::SchedulerConfig;
pub use errors::SchedulerError;
pub use types::{ProcessId, SchedulerResult, Step};
