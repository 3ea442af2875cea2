//! Sweep compilation: resolves every training run up front, then emits the
//! slicing, training, comparison and summary jobs in that order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use sweep_core::serde::to_canonical_json_string;
use sweep_core::{ErrorInfo, Locator, ParamValue, Parameters, SweepError};
use sweep_plan::{Combination, OverrideTable, ParameterSource, ParameterSpace, SliceOption, SweepConfig};
use tracing::{debug, info};

use crate::artifact::{dependencies_of, Artifact};
use crate::compare::{ComparisonScheduler, EvaluationRecord};
use crate::descriptor::{path_value, ComparisonRow, JobDescriptor};
use crate::engine::ExecutionEngine;
use crate::governor::ResourceGovernor;
use crate::resources::ResourceRequest;
use crate::slices::{slice_name, SliceCache, TaskInputs};

pub const MODEL_ROOT: &str = "models";
pub const SLICE_AXIS: &str = "slice";
pub const RESULTS_FILE: &str = "results.txt";
pub const PREDICTIONS_FILE: &str = "predictions.lst";

/// A training run with every parameter resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingPlan {
    pub combination: Combination,
    pub task: String,
    pub slice: SliceOption,
    pub locator: Locator,
    pub save_path: PathBuf,
    pub parameters: Parameters,
    pub resources: ResourceRequest,
}

/// Everything needed to emit jobs, computed before the first submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub tasks: BTreeMap<String, TaskInputs>,
    pub training: Vec<TrainingPlan>,
}

/// Result of [`GraphBuilder::build`].
#[derive(Debug, Clone)]
pub struct BuildOutput<O> {
    pub workflow: O,
    pub evaluations: Vec<EvaluationRecord>,
    pub comparisons: Vec<ComparisonRow>,
    pub manifest_path: PathBuf,
}

/// Compiles a [`SweepConfig`] into jobs on an [`ExecutionEngine`].
pub struct GraphBuilder<'a, S> {
    config: &'a SweepConfig,
    source: S,
    space: ParameterSpace,
    overrides: OverrideTable,
}

impl<'a, S: ParameterSource> GraphBuilder<'a, S> {
    /// Parses the parameter space and override table of `config`.
    pub fn new(config: &'a SweepConfig, source: S) -> Result<Self, SweepError> {
        let space = config.space()?;
        let overrides = config.overrides(&space)?;
        Ok(Self {
            config,
            source,
            space,
            overrides,
        })
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    /// `{model: <model>}` unified with the train namespace.
    pub fn base_parameters(&self) -> Parameters {
        Parameters::from_pairs([("model", self.config.model.to_value())]).unify(&self.config.train)
    }

    /// Parameters of the training job for `combination`: base layer, the
    /// combination's own values, option files, the cluster partition and
    /// finally the matching overrides.
    pub fn resolve_parameters(&self, combination: &Combination) -> Result<Parameters, SweepError> {
        let mut params = self.base_parameters();
        params.unify_in_place(&combination.to_parameters());
        for (axis, value) in combination.pairs() {
            if let Some(layer) = self.source.option_parameters(axis, value)? {
                params.unify_in_place(&layer);
            }
        }
        params.insert("partition", json!(self.config.partition));
        Ok(self.overrides.apply(&params, combination))
    }

    /// Resources of a training job: the global layer unified with the
    /// resolved parameters, forced onto the training partition.
    pub fn resource_request(&self, params: &Parameters) -> Result<ResourceRequest, SweepError> {
        let merged = self.config.global().unify(params);
        let requested = ResourceRequest::from_parameters(&merged)?;
        let minutes = merged.positive_integer("job_time_in_minutes")?;
        Ok(requested.unify(
            &ResourceRequest::minutes(minutes).with_partition(self.config.training_partition.clone()),
        ))
    }

    /// Resolves every task and training run without touching an engine.
    pub fn plan(&self) -> Result<SweepPlan, SweepError> {
        let project_root = self.config.project_root();
        let mut tasks = BTreeMap::new();
        for task in self.space.tasks() {
            let params = self.source.task_parameters(&task)?;
            let inputs = TaskInputs::from_parameters(&task, &params, &project_root)?;
            tasks.insert(task, inputs);
        }

        let experiment_root = self.config.experiment_root();
        let mut training = Vec::new();
        let mut claimed = OutputClaims::default();
        for combination in self.space.combinations()? {
            let task = combination.task()?;
            let parameters = self.resolve_parameters(&combination)?;
            let resources = self.resource_request(&parameters)?;
            for slice in &self.config.slice_options {
                let name = slice_name(&task, *slice);
                let mut segments = vec![MODEL_ROOT.to_string()];
                segments.extend(combination.labels());
                segments.push(name.clone());
                let locator = Locator::new(segments);
                let save_path =
                    experiment_root.join(format!("{}_{}", combination.options_name(), name));
                claimed.claim(&locator, &save_path, &combination)?;
                training.push(TrainingPlan {
                    combination: combination.clone(),
                    task: task.clone(),
                    slice: *slice,
                    locator,
                    save_path,
                    parameters: parameters.clone(),
                    resources: resources.clone(),
                });
            }
        }
        Ok(SweepPlan { tasks, training })
    }

    /// Emits the whole workflow on `engine` and finalizes it.
    ///
    /// Configuration errors surface from [`GraphBuilder::plan`] before any
    /// job is submitted.
    pub fn build<E: ExecutionEngine>(&self, mut engine: E) -> Result<BuildOutput<E::Output>, SweepError> {
        let plan = self.plan()?;
        info!(
            tasks = plan.tasks.len(),
            training_runs = plan.training.len(),
            "sweep planned"
        );
        let experiment_root = self.config.experiment_root();

        let mut slices = SliceCache::new(&experiment_root);
        for (task, inputs) in &plan.tasks {
            for slice in &self.config.slice_options {
                slices.get_or_create_slice(&mut engine, task, inputs, *slice)?;
            }
        }
        info!(slices = slices.len(), "slice jobs emitted");

        let mut evaluations = Vec::with_capacity(plan.training.len());
        for run in &plan.training {
            let entry = slices.get(&run.task, run.slice).ok_or_else(|| {
                SweepError::Graph(
                    ErrorInfo::new("slice-missing", "training run refers to an unsliced task")
                        .with_context("task", run.task.clone())
                        .with_context("slice", run.slice.label()),
                )
            })?;
            let mut parameters = run.parameters.clone();
            parameters.unify_in_place(&training_flags(&entry.x, &entry.y, &run.save_path));
            let dependencies = dependencies_of(&[&entry.x, &entry.y]);
            let handle = engine.submit(
                &run.locator,
                JobDescriptor::train(parameters),
                &dependencies,
                &run.resources,
            )?;
            debug!(locator = %run.locator, "training job emitted");
            evaluations.push(EvaluationRecord {
                combination: run
                    .combination
                    .with_pair(SLICE_AXIS, ParamValue::Str(run.slice.label())),
                task: run.task.clone(),
                results: Artifact::derived(run.save_path.join(RESULTS_FILE), handle),
                predictions: Artifact::derived(run.save_path.join(PREDICTIONS_FILE), handle),
            });
        }

        let gold_labels: BTreeMap<String, PathBuf> = plan
            .tasks
            .iter()
            .map(|(task, inputs)| (task.clone(), inputs.val_y.clone()))
            .collect();
        let scheduler = ComparisonScheduler::new(&experiment_root);
        let scheduled = scheduler.schedule(&mut engine, &evaluations, &gold_labels)?;
        scheduler.schedule_summary(&mut engine, &evaluations, &scheduled, &experiment_root)?;

        ResourceGovernor::from_config(self.config).apply(&mut engine)?;
        let workflow = engine.finalize()?;
        Ok(BuildOutput {
            workflow,
            evaluations,
            comparisons: scheduled.into_iter().map(|c| c.row).collect(),
            manifest_path: scheduler.manifest_path(),
        })
    }
}

/// Locators and output directories already taken by planned training runs.
///
/// Distinct combinations can render to the same labels (`[1, 1]`,
/// `[1, "1"]`), which would make two runs share a job and an output
/// directory.
#[derive(Default)]
struct OutputClaims {
    locators: BTreeMap<Locator, String>,
    save_paths: BTreeMap<PathBuf, String>,
}

impl OutputClaims {
    fn claim(
        &mut self,
        locator: &Locator,
        save_path: &Path,
        combination: &Combination,
    ) -> Result<(), SweepError> {
        let current = to_canonical_json_string(combination)?;
        let previous = self
            .locators
            .get(locator)
            .or_else(|| self.save_paths.get(save_path));
        if let Some(previous) = previous {
            return Err(SweepError::Config(
                ErrorInfo::new(
                    "combination-collision",
                    "two combinations resolve to the same training job",
                )
                .with_context("locator", locator.to_string())
                .with_context("save_path", save_path.display().to_string())
                .with_context("first", previous.clone())
                .with_context("second", current)
                .with_hint("remove duplicate candidates or give them distinct spellings"),
            ));
        }
        self.locators.insert(locator.clone(), current.clone());
        self.save_paths.insert(save_path.to_path_buf(), current);
        Ok(())
    }
}

fn training_flags(x: &Artifact, y: &Artifact, save_path: &Path) -> Parameters {
    Parameters::from_pairs([
        ("train_x", path_value(x.value())),
        ("train_y", path_value(y.value())),
        ("save_path", path_value(save_path)),
        ("save_best_only", Value::Bool(false)),
        ("save_by_date_and_parameters", Value::Bool(false)),
        ("eval_after_training", Value::Bool(true)),
    ])
}
