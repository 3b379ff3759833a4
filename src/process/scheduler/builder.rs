/*!
 * Scheduler Builder
 * Builder pattern for Scheduler construction
 */

use super::{Scheduler, Shared};
use crate::core::config::{hardware_capacity, SchedulerConfig};
use crate::core::errors::SchedulerError;
use crate::core::types::SchedulerResult;
use std::sync::Arc;
use tracing::info;

/// Builder for [`Scheduler`]
#[derive(Debug, Default)]
pub struct SchedulerBuilder {
    config: Option<SchedulerConfig>,
    capacity: Option<usize>,
    runtime: Option<tokio::runtime::Handle>,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take settings from a resolved configuration
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Worker budget; overrides the configuration
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Runtime that hosts segment tasks; defaults to the ambient one
    pub fn with_runtime(mut self, runtime: tokio::runtime::Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the Scheduler
    pub fn build(self) -> SchedulerResult<Scheduler> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => tokio::runtime::Handle::try_current()
                .map_err(|e| SchedulerError::RuntimeUnavailable(e.to_string()))?,
        };

        let capacity = self
            .capacity
            .or_else(|| self.config.as_ref().map(|c| c.capacity))
            .unwrap_or_else(hardware_capacity);

        info!(capacity, "Scheduler initialized");

        Ok(Scheduler {
            shared: Arc::new(Shared::new(capacity, runtime)),
        })
    }
}
