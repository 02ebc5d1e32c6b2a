//! Orchestrator configuration.

use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// Tunables for a [`RunController`](crate::RunController).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Tests executed concurrently per batch.
    ///
    /// Defaults to 1. Larger batches have caused failures in some executors
    /// and the safe upper bound is not known, so raise it deliberately.
    pub batch_size: NonZeroUsize,
    /// Buffered run events per subscriber before old events are dropped
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_size: NonZeroUsize::MIN,
            event_capacity: 256,
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        debug!("Loaded orchestrator config from {:?}: {:?}", path, config);
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn batch_size(mut self, size: usize) -> CoreResult<Self> {
        self.batch_size = NonZeroUsize::new(size)
            .ok_or_else(|| CoreError::InvalidConfig("batch_size must be at least 1".to_string()))?;
        Ok(self)
    }

    pub fn event_capacity(mut self, capacity: usize) -> CoreResult<Self> {
        self.event_capacity = capacity;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> CoreResult<()> {
        if self.event_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
