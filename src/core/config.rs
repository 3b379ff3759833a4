/*!
 * Scheduler Configuration
 * Environment-driven settings with hardware-derived defaults
 */

use super::errors::SchedulerError;
use super::limits::{ENV_CAPACITY, ENV_TRACE_JSON, FALLBACK_CAPACITY};
use super::types::SchedulerResult;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Scheduler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SchedulerConfig {
    /// Maximum number of concurrently running processes
    pub capacity: usize,
    /// Emit JSON-formatted logs
    pub trace_json: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: hardware_capacity(),
            trace_json: false,
        }
    }
}

impl SchedulerConfig {
    /// Resolve configuration from the process environment
    ///
    /// Environment variables:
    /// - SIM_SCHEDULER_CAPACITY: worker budget (default: available parallelism)
    /// - SIM_TRACE_JSON: enable JSON log output (default: false)
    pub fn from_env() -> SchedulerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> SchedulerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CAPACITY) {
            config.capacity = parse_var(ENV_CAPACITY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TRACE_JSON) {
            config.trace_json = parse_flag(ENV_TRACE_JSON, &raw)?;
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Number of hardware execution units, or the fallback when unknown
pub fn hardware_capacity() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_CAPACITY)
}

/// Parse a numeric environment value
pub fn parse_var<T>(key: &str, raw: &str) -> SchedulerResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| SchedulerError::InvalidConfig(format!("{}={:?}: {}", key, raw, e)))
}

/// Parse a boolean environment flag (1/0, true/false, yes/no, on/off)
pub fn parse_flag(key: &str, raw: &str) -> SchedulerResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(SchedulerError::InvalidConfig(format!(
            "{}={:?}: expected a boolean",
            key, other
        ))),
    }
}
