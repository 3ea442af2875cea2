use std::path::Path;

use sweep_core::{Locator, SweepError};

use crate::artifact::{Artifact, JobHandle};
use crate::descriptor::JobDescriptor;
use crate::resources::ResourceRequest;

/// Boundary to the workflow engine that records and later runs jobs.
///
/// Graph construction only ever talks to this trait. Errors returned by an
/// implementation are propagated unchanged.
pub trait ExecutionEngine {
    /// Value produced once the graph is complete.
    type Output;

    /// Registers a job under `locator`, after every job in `dependencies`.
    fn submit(
        &mut self,
        locator: &Locator,
        descriptor: JobDescriptor,
        dependencies: &[JobHandle],
        resources: &ResourceRequest,
    ) -> Result<JobHandle, SweepError>;

    /// Wraps a file that exists before the workflow runs.
    fn preexisting_artifact(&mut self, path: &Path) -> Artifact {
        Artifact::preexisting(path)
    }

    /// Caps how many jobs of `category` may run at once.
    fn set_concurrency_limit(&mut self, category: &str, max_jobs: usize) -> Result<(), SweepError>;

    /// Seals the graph.
    fn finalize(self) -> Result<Self::Output, SweepError>
    where
        Self: Sized;
}
