use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sweep_core::errors::{ErrorInfo, SweepError};
use sweep_core::{ParamValue, Parameters};

/// Name of the axis every sweep must declare.
pub const TASK_AXIS: &str = "task";

/// One sweep-able parameter and its candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterAxis {
    pub name: String,
    pub values: Vec<ParamValue>,
}

impl ParameterAxis {
    pub fn new(name: impl Into<String>, values: Vec<ParamValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Validated parameter space: ordered axes, exactly one of them `task`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpace {
    axes: Vec<ParameterAxis>,
}

impl ParameterSpace {
    /// Builds a space, rejecting empty axes, duplicate names and a missing
    /// `task` axis.
    pub fn new(axes: Vec<ParameterAxis>) -> Result<Self, SweepError> {
        let mut seen = BTreeSet::new();
        for axis in &axes {
            if !seen.insert(axis.name.as_str()) {
                return Err(SweepError::Config(
                    ErrorInfo::new("axis-duplicate", "axis declared more than once")
                        .with_context("axis", axis.name.clone()),
                ));
            }
            if axis.is_empty() {
                return Err(empty_axis(&axis.name));
            }
        }
        if !seen.contains(TASK_AXIS) {
            return Err(SweepError::Config(
                ErrorInfo::new("axis-missing-task", "the sweep has no `task` axis")
                    .with_hint("declare `task` under parameter_options"),
            ));
        }
        Ok(Self { axes })
    }

    /// Builds a space from the `parameter_options` mapping, keeping declaration order.
    pub fn from_options(options: &IndexMap<String, Vec<ParamValue>>) -> Result<Self, SweepError> {
        Self::new(
            options
                .iter()
                .map(|(name, values)| ParameterAxis::new(name.clone(), values.clone()))
                .collect(),
        )
    }

    pub fn axes(&self) -> &[ParameterAxis] {
        &self.axes
    }

    pub fn axis(&self, name: &str) -> Option<&ParameterAxis> {
        self.axes.iter().find(|axis| axis.name == name)
    }

    /// Distinct task labels in declaration order.
    pub fn tasks(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.axis(TASK_AXIS)
            .map(|axis| {
                axis.values
                    .iter()
                    .map(ParamValue::to_string)
                    .filter(|task| seen.insert(task.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Product of axis sizes.
    pub fn combination_count(&self) -> usize {
        self.axes.iter().map(ParameterAxis::len).product()
    }

    /// Every point of the space, earlier axes varying slowest.
    pub fn combinations(&self) -> Result<Vec<Combination>, SweepError> {
        expand(&self.axes)
    }
}

fn empty_axis(name: &str) -> SweepError {
    SweepError::Config(
        ErrorInfo::new("axis-empty", "axis has no candidate values")
            .with_context("axis", name.to_string()),
    )
}

/// Computes the cartesian product of `axes`.
///
/// Nothing is skipped or deduplicated. An axis with no candidates cannot
/// produce a combination and is reported as a configuration error.
pub fn expand(axes: &[ParameterAxis]) -> Result<Vec<Combination>, SweepError> {
    if let Some(axis) = axes.iter().find(|axis| axis.is_empty()) {
        return Err(empty_axis(&axis.name));
    }
    let mut outputs = Vec::with_capacity(axes.iter().map(ParameterAxis::len).product());
    expand_grid(axes, 0, Vec::with_capacity(axes.len()), &mut outputs);
    Ok(outputs)
}

fn expand_grid(
    axes: &[ParameterAxis],
    idx: usize,
    current: Vec<(String, ParamValue)>,
    outputs: &mut Vec<Combination>,
) {
    if idx == axes.len() {
        outputs.push(Combination(current));
        return;
    }
    let axis = &axes[idx];
    for value in &axis.values {
        let mut next = current.clone();
        next.push((axis.name.clone(), value.clone()));
        expand_grid(axes, idx + 1, next, outputs);
    }
}

/// One fully assigned sweep point: `(axis, value)` pairs in axis order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Combination(Vec<(String, ParamValue)>);

impl Combination {
    pub fn new(pairs: Vec<(String, ParamValue)>) -> Self {
        Self(pairs)
    }

    pub fn pairs(&self) -> &[(String, ParamValue)] {
        &self.0
    }

    /// Value assigned to `axis`, if the combination carries it.
    pub fn get(&self, axis: &str) -> Option<&ParamValue> {
        self.0
            .iter()
            .find(|(name, _)| name == axis)
            .map(|(_, value)| value)
    }

    /// The single `task` value of this combination.
    pub fn task(&self) -> Result<String, SweepError> {
        let mut tasks = self.0.iter().filter(|(name, _)| name == TASK_AXIS);
        let first = tasks.next().ok_or_else(|| {
            SweepError::Config(
                ErrorInfo::new("combination-missing-task", "combination has no `task` value")
                    .with_context("combination", self.options_name()),
            )
        })?;
        if tasks.next().is_some() {
            return Err(SweepError::Config(
                ErrorInfo::new(
                    "combination-ambiguous-task",
                    "combination assigns `task` more than once",
                )
                .with_context("combination", self.options_name()),
            ));
        }
        if first.1.is_default() {
            return Err(SweepError::Config(
                ErrorInfo::new("task-is-default", "`task` cannot use the default sentinel")
                    .with_context("combination", self.options_name()),
            ));
        }
        Ok(first.1.to_string())
    }

    /// Raw combination values as parameters; sentinel values are skipped.
    pub fn to_parameters(&self) -> Parameters {
        self.0
            .iter()
            .filter_map(|(name, value)| value.to_json().map(|json| (name.clone(), json)))
            .collect()
    }

    /// Locator segments, one per axis value.
    pub fn labels(&self) -> Vec<String> {
        self.0.iter().map(|(_, value)| value.label()).collect()
    }

    /// `axis=value` pairs joined with `_`, used to name output directories.
    pub fn options_name(&self) -> String {
        self.0
            .iter()
            .map(|(name, value)| format!("{}={}", name, value.label()))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Returns a copy with one more pair appended.
    pub fn with_pair(&self, name: impl Into<String>, value: ParamValue) -> Combination {
        let mut pairs = self.0.clone();
        pairs.push((name.into(), value));
        Combination(pairs)
    }
}
