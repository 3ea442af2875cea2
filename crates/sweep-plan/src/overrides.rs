use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use sweep_core::errors::{ErrorInfo, SweepError};
use sweep_core::{ParamValue, Parameters};
use tracing::warn;

use crate::space::{Combination, ParameterAxis, ParameterSpace};

/// Reserved override key naming the axes an override was authored against.
/// It is metadata and never reaches job parameters.
pub const PARAMETER_OPTIONS_KEY: &str = "parameter_options";

fn override_error(code: &str, name: &str, message: impl Into<String>) -> SweepError {
    SweepError::Config(ErrorInfo::new(code, message).with_context("override", name.to_string()))
}

/// Requirement an override places on one axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AxisConstraint {
    /// The axis must hold exactly this value.
    Exact(ParamValue),
    /// The axis must hold one of these values.
    AnyOf(Vec<ParamValue>),
}

impl AxisConstraint {
    /// Exact equality; the "use default" sentinel only admits itself.
    pub fn admits(&self, value: &ParamValue) -> bool {
        match self {
            AxisConstraint::Exact(expected) => expected == value,
            AxisConstraint::AnyOf(options) => options.contains(value),
        }
    }

    /// True when every candidate of `axis` is admitted, i.e. the constraint
    /// does not narrow the axis at all.
    pub fn covers(&self, axis: &ParameterAxis) -> bool {
        axis.values.iter().all(|value| self.admits(value))
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(ParamValue::from_json)
                .collect::<Option<Vec<_>>>()
                .map(AxisConstraint::AnyOf),
            scalar => ParamValue::from_json(scalar).map(AxisConstraint::Exact),
        }
    }
}

/// Conditional parameter patch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Override {
    pub name: String,
    /// Axis requirements; axes not listed are wildcards.
    pub pattern: IndexMap<String, AxisConstraint>,
    /// Parameters merged into matching jobs.
    pub payload: Parameters,
}

impl Override {
    pub fn new(
        name: impl Into<String>,
        pattern: IndexMap<String, AxisConstraint>,
        payload: Parameters,
    ) -> Self {
        Self {
            name: name.into(),
            pattern,
            payload,
        }
    }

    /// Parses an override body from the sweep configuration.
    ///
    /// The pattern axes are those listed under `parameter_options`; without
    /// that key every body key naming an axis of `space` is a pattern axis.
    /// Pattern keys and `parameter_options` are removed from the payload.
    pub fn from_value(name: &str, body: &Value, space: &ParameterSpace) -> Result<Self, SweepError> {
        let Value::Object(map) = body else {
            return Err(override_error(
                "override-not-mapping",
                name,
                "override body must be a mapping",
            ));
        };
        let pattern_axes: Vec<String> = match map.get(PARAMETER_OPTIONS_KEY) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| {
                    override_error(
                        "override-options-invalid",
                        name,
                        "`parameter_options` must list axis names",
                    )
                })?,
            Some(_) => {
                return Err(override_error(
                    "override-options-invalid",
                    name,
                    "`parameter_options` must be a list",
                ))
            }
            None => map
                .keys()
                .filter(|key| space.axis(key).is_some())
                .cloned()
                .collect(),
        };

        let mut pattern = IndexMap::new();
        for axis in &pattern_axes {
            let Some(raw) = map.get(axis) else {
                continue;
            };
            let constraint = AxisConstraint::from_json(raw).ok_or_else(|| {
                SweepError::Config(
                    ErrorInfo::new(
                        "override-pattern-invalid",
                        "pattern values must be scalars or lists of scalars",
                    )
                    .with_context("override", name.to_string())
                    .with_context("axis", axis.clone()),
                )
            })?;
            if space.axis(axis).is_none() {
                warn!(override_name = name, axis = %axis, "override pattern names an unknown axis");
            }
            pattern.insert(axis.clone(), constraint);
        }

        let payload = map
            .iter()
            .filter(|(key, _)| key.as_str() != PARAMETER_OPTIONS_KEY && !pattern.contains_key(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(Self::new(name, pattern, payload))
    }

    /// True when every pattern axis admits the combination's value.
    pub fn matches(&self, combination: &Combination) -> bool {
        self.pattern.iter().all(|(axis, constraint)| {
            combination
                .get(axis)
                .map(|value| constraint.admits(value))
                .unwrap_or(false)
        })
    }

    /// Number of axes of `space` this override leaves unconstrained.
    pub fn generality(&self, space: &ParameterSpace) -> usize {
        space
            .axes()
            .iter()
            .filter(|axis| match self.pattern.get(&axis.name) {
                None => true,
                Some(constraint) => constraint.covers(axis),
            })
            .count()
    }
}

/// Orders overrides from most general to most specific.
///
/// The sort is stable, so overrides of equal generality keep their
/// declaration order. Applying the result front to back lets specific
/// payloads overwrite general ones.
pub fn sort_by_generality(mut overrides: Vec<Override>, space: &ParameterSpace) -> Vec<Override> {
    overrides.sort_by_key(|entry| std::cmp::Reverse(entry.generality(space)));
    overrides
}

/// Override library sorted once for repeated resolution.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OverrideTable {
    entries: Vec<Override>,
}

impl OverrideTable {
    pub fn new(overrides: Vec<Override>, space: &ParameterSpace) -> Self {
        Self {
            entries: sort_by_generality(overrides, space),
        }
    }

    /// Parses `training_overrides` in declaration order.
    pub fn from_config(
        overrides: &IndexMap<String, Value>,
        space: &ParameterSpace,
    ) -> Result<Self, SweepError> {
        let parsed = overrides
            .iter()
            .map(|(name, body)| Override::from_value(name, body, space))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(parsed, space))
    }

    /// Entries in application order.
    pub fn entries(&self) -> &[Override] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matching overrides in application order.
    pub fn matching<'a>(
        &'a self,
        combination: &'a Combination,
    ) -> impl Iterator<Item = &'a Override> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.matches(combination))
    }

    /// Layers every matching payload over `params`.
    pub fn apply(&self, params: &Parameters, combination: &Combination) -> Parameters {
        let mut resolved = params.clone();
        for entry in self.matching(combination) {
            resolved.unify_in_place(&entry.payload);
        }
        resolved
    }
}

/// Resolves the final parameters of one combination.
pub fn resolve(base: &Parameters, combination: &Combination, table: &OverrideTable) -> Parameters {
    table.apply(base, combination)
}
