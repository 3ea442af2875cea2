use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sweep_core::{Locator, Parameters, SweepError};
use sweep_plan::SliceOption;
use tracing::debug;

use crate::artifact::{Artifact, JobHandle};
use crate::descriptor::JobDescriptor;
use crate::engine::ExecutionEngine;
use crate::resources::{ResourceRequest, DEFAULT_JOB_MINUTES};

const SLICE_ROOT: &str = "slice";
const SLICE_DIR: &str = "slices";

/// Data files a task's parameter layer must name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInputs {
    pub train_x: PathBuf,
    pub train_y: PathBuf,
    pub val_y: PathBuf,
}

impl TaskInputs {
    /// Reads `train_x`, `train_y` and `val_y`; relative paths are taken
    /// from `project_root`.
    pub fn from_parameters(
        task: &str,
        params: &Parameters,
        project_root: &Path,
    ) -> Result<Self, SweepError> {
        let read = |key: &str| {
            params
                .path(key)
                .map(|path| project_root.join(path))
                .map_err(|err| err.with_context("task", task))
        };
        Ok(Self {
            train_x: read("train_x")?,
            train_y: read("train_y")?,
            val_y: read("val_y")?,
        })
    }
}

/// Artifacts of one sliced training set.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceEntry {
    pub name: String,
    pub x: Artifact,
    pub y: Artifact,
}

/// Memoized slicing jobs keyed by `(task, slice option)`.
///
/// The cache is owned by a single graph build; every key maps to exactly one
/// pair of slicing jobs no matter how many training runs consume it.
#[derive(Debug, Clone)]
pub struct SliceCache {
    experiment_root: PathBuf,
    entries: BTreeMap<(String, SliceOption), SliceEntry>,
}

impl SliceCache {
    pub fn new(experiment_root: impl Into<PathBuf>) -> Self {
        Self {
            experiment_root: experiment_root.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, task: &str, slice: SliceOption) -> Option<&SliceEntry> {
        self.entries.get(&(task.to_string(), slice))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the slice of `task` for `slice`, submitting its two slicing
    /// jobs the first time the key is requested.
    pub fn get_or_create_slice<E: ExecutionEngine>(
        &mut self,
        engine: &mut E,
        task: &str,
        inputs: &TaskInputs,
        slice: SliceOption,
    ) -> Result<&SliceEntry, SweepError> {
        match self.entries.entry((task.to_string(), slice)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(vacant) => {
                let entry = create_slice(engine, &self.experiment_root, task, inputs, slice)?;
                Ok(vacant.insert(entry))
            }
        }
    }
}

fn create_slice<E: ExecutionEngine>(
    engine: &mut E,
    experiment_root: &Path,
    task: &str,
    inputs: &TaskInputs,
    slice: SliceOption,
) -> Result<SliceEntry, SweepError> {
    let dir = slice_output_dir(experiment_root, task, slice);
    let locator = slice_locator(task, slice);
    let resources = ResourceRequest::minutes(DEFAULT_JOB_MINUTES);

    let x = slice_file(
        engine,
        &locator.child("x"),
        &inputs.train_x,
        &dir.join("train.jsonl"),
        slice,
        &resources,
    )?;
    let y = slice_file(
        engine,
        &locator.child("y"),
        &inputs.train_y,
        &dir.join("train-labels.lst"),
        slice,
        &resources,
    )?;
    debug!(task, slice = %slice.label(), "slice jobs submitted");
    Ok(SliceEntry {
        name: slice_name(task, slice),
        x,
        y,
    })
}

fn slice_file<E: ExecutionEngine>(
    engine: &mut E,
    locator: &Locator,
    input: &Path,
    output: &Path,
    slice: SliceOption,
    resources: &ResourceRequest,
) -> Result<Artifact, SweepError> {
    let source = engine.preexisting_artifact(input);
    let dependencies: Vec<JobHandle> = source.producers().iter().copied().collect();
    let handle = engine.submit(
        locator,
        JobDescriptor::slice(source.value(), output, slice),
        &dependencies,
        resources,
    )?;
    Ok(Artifact::derived(output, handle))
}

/// `slice/<task>/<seed>_<percent>`; the x and y jobs sit underneath.
pub fn slice_locator(task: &str, slice: SliceOption) -> Locator {
    Locator::new([SLICE_ROOT.to_string(), task.to_string(), slice.label()])
}

/// Name shared by every training run on this slice.
pub fn slice_name(task: &str, slice: SliceOption) -> String {
    format!("slice_{}_{}", task, slice.label())
}

pub fn slice_output_dir(experiment_root: &Path, task: &str, slice: SliceOption) -> PathBuf {
    experiment_root
        .join(SLICE_DIR)
        .join(task)
        .join(format!("seed{}_pct{}", slice.seed, slice.percent))
}
