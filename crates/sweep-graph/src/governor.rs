use sweep_core::SweepError;
use sweep_plan::SweepConfig;
use tracing::info;

use crate::engine::ExecutionEngine;

/// Cap on concurrently running jobs of one resource category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGovernor {
    pub category: String,
    pub max_concurrent: usize,
}

impl ResourceGovernor {
    pub fn new(category: impl Into<String>, max_concurrent: usize) -> Self {
        Self {
            category: category.into(),
            max_concurrent,
        }
    }

    /// Limit applied to the training partition.
    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(config.training_partition.clone(), config.max_jobs_on_mics)
    }

    /// Declares the limit on `engine`. Jobs submitted before or after the
    /// call are governed alike.
    pub fn apply<E: ExecutionEngine>(&self, engine: &mut E) -> Result<(), SweepError> {
        info!(category = %self.category, max = self.max_concurrent, "concurrency limit");
        engine.set_concurrency_limit(&self.category, self.max_concurrent)
    }
}
