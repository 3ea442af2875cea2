use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Opaque token identifying a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobHandle(u64);

impl JobHandle {
    /// Creates a handle from its raw integer representation.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the handle.
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

/// Named data output together with the jobs that produce it.
///
/// Preexisting artifacts (input datasets) have no producer; derived
/// artifacts have exactly one. Dependents reference the producer, they do
/// not own it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    value: PathBuf,
    depends_on: BTreeSet<JobHandle>,
}

impl Artifact {
    pub fn preexisting(path: impl Into<PathBuf>) -> Self {
        Self {
            value: path.into(),
            depends_on: BTreeSet::new(),
        }
    }

    pub fn derived(path: impl Into<PathBuf>, producer: JobHandle) -> Self {
        Self {
            value: path.into(),
            depends_on: BTreeSet::from([producer]),
        }
    }

    pub fn value(&self) -> &Path {
        &self.value
    }

    pub fn producers(&self) -> &BTreeSet<JobHandle> {
        &self.depends_on
    }

    pub fn is_preexisting(&self) -> bool {
        self.depends_on.is_empty()
    }
}

/// Producers of `artifacts`, deduplicated in first-seen order.
pub fn dependencies_of(artifacts: &[&Artifact]) -> Vec<JobHandle> {
    let mut seen = BTreeSet::new();
    artifacts
        .iter()
        .flat_map(|artifact| artifact.producers().iter().copied())
        .filter(|handle| seen.insert(*handle))
        .collect()
}
