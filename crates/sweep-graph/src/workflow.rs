use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sweep_core::{ErrorInfo, Locator, Parameters, SweepError};
use tracing::debug;

use crate::artifact::JobHandle;
use crate::descriptor::{JobDescriptor, JobKind};
use crate::engine::ExecutionEngine;
use crate::resources::ResourceRequest;

/// Whether a job still has to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    /// Completed by an earlier run, together with everything it depends on.
    Satisfied,
}

/// A job as recorded in the workflow description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub handle: JobHandle,
    pub locator: Locator,
    pub kind: JobKind,
    pub parameters: Parameters,
    pub dependencies: Vec<Locator>,
    pub resources: ResourceRequest,
    pub status: JobStatus,
}

impl JobRecord {
    pub fn category(&self) -> Option<&str> {
        self.resources.category()
    }
}

/// Serializable result of a compiled sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDescription {
    pub jobs: Vec<JobRecord>,
    pub concurrency_limits: BTreeMap<String, usize>,
}

impl WorkflowDescription {
    /// Looks a job up by its `/`-joined locator.
    pub fn job(&self, locator: &str) -> Option<&JobRecord> {
        self.jobs
            .iter()
            .find(|job| job.locator.to_string() == locator)
    }

    pub fn jobs_of_kind(&self, kind: JobKind) -> impl Iterator<Item = &JobRecord> {
        self.jobs.iter().filter(move |job| job.kind == kind)
    }

    pub fn pending(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs
            .iter()
            .filter(|job| job.status == JobStatus::Pending)
    }

    /// Number of jobs counted against `category`.
    pub fn category_size(&self, category: &str) -> usize {
        self.jobs
            .iter()
            .filter(|job| job.category() == Some(category))
            .count()
    }
}

/// In-memory execution engine producing a [`WorkflowDescription`].
///
/// Jobs are kept in submission order, so dependencies always precede their
/// dependents and the graph is acyclic by construction.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    jobs: Vec<JobRecord>,
    locators: BTreeSet<Locator>,
    limits: BTreeMap<String, usize>,
    completed: BTreeSet<Locator>,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks jobs whose locators appear in `completed` as satisfied.
    pub fn with_history<I>(mut self, completed: I) -> Self
    where
        I: IntoIterator<Item = Locator>,
    {
        self.completed.extend(completed);
        self
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn record(&self, handle: JobHandle) -> Option<&JobRecord> {
        usize::try_from(handle.as_raw())
            .ok()
            .and_then(|idx| self.jobs.get(idx))
    }
}

impl ExecutionEngine for WorkflowGraph {
    type Output = WorkflowDescription;

    fn submit(
        &mut self,
        locator: &Locator,
        descriptor: JobDescriptor,
        dependencies: &[JobHandle],
        resources: &ResourceRequest,
    ) -> Result<JobHandle, SweepError> {
        if self.locators.contains(locator) {
            return Err(SweepError::Engine(
                ErrorInfo::new("duplicate-locator", "locator already names a job")
                    .with_context("locator", locator.to_string()),
            ));
        }
        let mut dependency_locators = Vec::with_capacity(dependencies.len());
        let mut dependencies_satisfied = true;
        for handle in dependencies {
            let record = self.record(*handle).ok_or_else(|| {
                SweepError::Engine(
                    ErrorInfo::new("unknown-dependency", "dependency was never submitted")
                        .with_context("locator", locator.to_string())
                        .with_context("handle", handle.as_raw().to_string()),
                )
            })?;
            dependencies_satisfied &= record.status == JobStatus::Satisfied;
            dependency_locators.push(record.locator.clone());
        }
        let status = if dependencies_satisfied && self.completed.contains(locator) {
            JobStatus::Satisfied
        } else {
            JobStatus::Pending
        };
        let handle = JobHandle::from_raw(self.jobs.len() as u64);
        debug!(%locator, kind = ?descriptor.kind, ?status, "job recorded");
        self.locators.insert(locator.clone());
        self.jobs.push(JobRecord {
            handle,
            locator: locator.clone(),
            kind: descriptor.kind,
            parameters: descriptor.parameters,
            dependencies: dependency_locators,
            resources: resources.clone(),
            status,
        });
        Ok(handle)
    }

    fn set_concurrency_limit(&mut self, category: &str, max_jobs: usize) -> Result<(), SweepError> {
        if max_jobs == 0 {
            return Err(SweepError::Engine(
                ErrorInfo::new("limit-zero", "concurrency limit must be at least one")
                    .with_context("category", category),
            ));
        }
        if let Some(existing) = self.limits.get(category) {
            return Err(SweepError::Engine(
                ErrorInfo::new("limit-redeclared", "category already has a concurrency limit")
                    .with_context("category", category)
                    .with_context("existing", existing.to_string()),
            ));
        }
        self.limits.insert(category.to_string(), max_jobs);
        Ok(())
    }

    fn finalize(self) -> Result<WorkflowDescription, SweepError> {
        Ok(WorkflowDescription {
            jobs: self.jobs,
            concurrency_limits: self.limits,
        })
    }
}
