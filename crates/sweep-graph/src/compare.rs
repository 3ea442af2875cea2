use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sweep_core::serde::to_canonical_json_string;
use sweep_core::{ErrorInfo, Locator, Parameters, SweepError};
use sweep_plan::Combination;
use tracing::{debug, info};

use crate::artifact::{dependencies_of, Artifact, JobHandle};
use crate::descriptor::{path_value, ComparisonRow, JobDescriptor};
use crate::engine::ExecutionEngine;
use crate::resources::{ResourceRequest, DEFAULT_JOB_MINUTES};

/// Locator root and output directory of the comparison stage.
pub const COMPARISON_ROOT: &str = "percent_agreement";
pub const MANIFEST_FILE: &str = "comparisons.jsonl";
pub const AGREEMENT_FILE: &str = "agreement_data.csv";
pub const SUMMARY_FILE: &str = "summary.csv";

/// Outputs of one training run, ready to be compared.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    /// Sweep combination extended with the `slice` pair.
    pub combination: Combination,
    pub task: String,
    pub results: Artifact,
    pub predictions: Artifact,
}

/// Index pairs `(i, j)` with `i < j` whose tasks are equal, in scan order.
pub fn same_task_pairs<T: AsRef<str>>(tasks: &[T]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, first) in tasks.iter().enumerate() {
        for (offset, second) in tasks[i + 1..].iter().enumerate() {
            if first.as_ref() == second.as_ref() {
                pairs.push((i, i + 1 + offset));
            }
        }
    }
    pairs
}

/// A comparison job together with the manifest row it evaluates.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledComparison {
    pub locator: Locator,
    pub handle: JobHandle,
    pub row: ComparisonRow,
    pub output: PathBuf,
}

/// Emits one agreement job per same-task pair of evaluations.
#[derive(Debug, Clone)]
pub struct ComparisonScheduler {
    output_dir: PathBuf,
}

impl ComparisonScheduler {
    pub fn new(experiment_root: &Path) -> Self {
        Self {
            output_dir: experiment_root.join(COMPARISON_ROOT),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(MANIFEST_FILE)
    }

    /// Submits the pairwise comparisons. `gold_labels` maps each task to its
    /// validation labels; every task in `records` must be present.
    pub fn schedule<E: ExecutionEngine>(
        &self,
        engine: &mut E,
        records: &[EvaluationRecord],
        gold_labels: &BTreeMap<String, PathBuf>,
    ) -> Result<Vec<ScheduledComparison>, SweepError> {
        let tasks: Vec<&str> = records.iter().map(|record| record.task.as_str()).collect();
        let resources = ResourceRequest::minutes(DEFAULT_JOB_MINUTES);
        let mut scheduled = Vec::new();
        for (i, j) in same_task_pairs(&tasks) {
            let (first, second) = (&records[i], &records[j]);
            let gold_path = gold_labels.get(&first.task).ok_or_else(|| {
                SweepError::Graph(
                    ErrorInfo::new("gold-labels-missing", "task has no validation labels")
                        .with_context("task", first.task.clone()),
                )
            })?;
            let gold = engine.preexisting_artifact(gold_path);
            let row = ComparisonRow {
                model1_combination: first.combination.clone(),
                model2_combination: second.combination.clone(),
                model1_accuracy: first.results.value().to_path_buf(),
                model2_accuracy: second.results.value().to_path_buf(),
                model1_predicted_labels: first.predictions.value().to_path_buf(),
                model2_predicted_labels: second.predictions.value().to_path_buf(),
                gold_labels: gold.value().to_path_buf(),
            };
            let pair = format!("{i}_{j}");
            let locator = Locator::new([COMPARISON_ROOT, first.task.as_str(), pair.as_str()]);
            let output = self
                .output_dir
                .join(&first.task)
                .join(format!("{pair}.csv"));
            let dependencies = dependencies_of(&[
                &first.results,
                &first.predictions,
                &second.results,
                &second.predictions,
                &gold,
            ]);
            let handle = engine.submit(
                &locator,
                JobDescriptor::compare(std::slice::from_ref(&row), &output)?,
                &dependencies,
                &resources,
            )?;
            debug!(%locator, "comparison scheduled");
            scheduled.push(ScheduledComparison {
                locator,
                handle,
                row,
                output,
            });
        }
        info!(comparisons = scheduled.len(), "comparison stage planned");
        Ok(scheduled)
    }

    /// Submits the job aggregating every pairwise table, or nothing when
    /// there are no comparisons. It runs after every training run in
    /// `records` and every comparison.
    pub fn schedule_summary<E: ExecutionEngine>(
        &self,
        engine: &mut E,
        records: &[EvaluationRecord],
        comparisons: &[ScheduledComparison],
        experiment_root: &Path,
    ) -> Result<Option<JobHandle>, SweepError> {
        if comparisons.is_empty() {
            return Ok(None);
        }
        let outputs: Vec<&Artifact> = records
            .iter()
            .flat_map(|record| [&record.results, &record.predictions])
            .collect();
        let mut dependencies = dependencies_of(&outputs);
        dependencies.extend(comparisons.iter().map(|c| c.handle));
        let tables = comparisons
            .iter()
            .map(|c| path_value(&c.output))
            .collect::<Vec<_>>();
        let parameters = Parameters::from_pairs([
            ("comparisons_to_make", path_value(&self.manifest_path())),
            ("comparison_results", Value::Array(tables)),
            (
                "save_agreement_seqs_to",
                path_value(&experiment_root.join(AGREEMENT_FILE)),
            ),
            (
                "save_comparison_results_to",
                path_value(&experiment_root.join(SUMMARY_FILE)),
            ),
        ]);
        let handle = engine.submit(
            &Locator::new([COMPARISON_ROOT, "summary"]),
            JobDescriptor::summary(parameters),
            &dependencies,
            &ResourceRequest::minutes(DEFAULT_JOB_MINUTES),
        )?;
        Ok(Some(handle))
    }
}

/// Writes `rows` as JSON lines, creating parent directories as needed.
pub fn write_manifest(path: &Path, rows: &[ComparisonRow]) -> Result<(), SweepError> {
    let io_error = |code: &str, err: std::io::Error| {
        SweepError::Serde(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| io_error("manifest_dir", err))?;
    }
    let mut file = fs::File::create(path).map_err(|err| io_error("manifest_create", err))?;
    for row in rows {
        let line = to_canonical_json_string(row)?;
        writeln!(file, "{line}").map_err(|err| io_error("manifest_write", err))?;
    }
    Ok(())
}
