use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sweep_core::{ErrorInfo, Parameters, SweepError};
use sweep_plan::{Combination, SliceOption};

/// Kind of work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Slice,
    Train,
    Compare,
    Summary,
}

/// What the execution engine should run: a job kind plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub kind: JobKind,
    pub parameters: Parameters,
}

impl JobDescriptor {
    pub fn new(kind: JobKind, parameters: Parameters) -> Self {
        Self { kind, parameters }
    }

    /// Random subset of `input` written to `output`.
    pub fn slice(input: &Path, output: &Path, slice: SliceOption) -> Self {
        Self::new(
            JobKind::Slice,
            Parameters::from_pairs([
                ("input", path_value(input)),
                ("output", path_value(output)),
                ("random_seed", json!(slice.seed)),
                ("fraction", json!(slice.fraction())),
            ]),
        )
    }

    pub fn train(parameters: Parameters) -> Self {
        Self::new(JobKind::Train, parameters)
    }

    /// Pairwise agreement job over `rows`, writing its table to `output`.
    pub fn compare(rows: &[ComparisonRow], output: &Path) -> Result<Self, SweepError> {
        let rows = rows
            .iter()
            .map(ComparisonRow::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(
            JobKind::Compare,
            Parameters::from_pairs([
                ("comparisons", Value::Array(rows)),
                ("save_comparison_results_to", path_value(output)),
            ]),
        ))
    }

    pub fn summary(parameters: Parameters) -> Self {
        Self::new(JobKind::Summary, parameters)
    }
}

/// One entry of the comparison manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub model1_combination: Combination,
    pub model2_combination: Combination,
    pub model1_accuracy: PathBuf,
    pub model2_accuracy: PathBuf,
    pub model1_predicted_labels: PathBuf,
    pub model2_predicted_labels: PathBuf,
    pub gold_labels: PathBuf,
}

impl ComparisonRow {
    pub fn to_value(&self) -> Result<Value, SweepError> {
        serde_json::to_value(self).map_err(|err| {
            SweepError::Serde(ErrorInfo::new("json_serialize", err.to_string()))
        })
    }
}

/// Paths travel as plain strings inside job parameters.
pub fn path_value(path: &Path) -> Value {
    Value::String(path.to_string_lossy().into_owned())
}
