use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sweep_core::errors::{ErrorInfo, SweepError};
use sweep_core::serde::from_yaml_slice;
use sweep_core::{ParamValue, Parameters};
use tracing::debug;

use crate::space::TASK_AXIS;

/// Key listing parameter files merged underneath the including file.
pub const INCLUDES_KEY: &str = "_includes";

/// Extension of parameter files.
pub const PARAMS_EXTENSION: &str = "params";

const MAX_INCLUDE_DEPTH: usize = 16;

/// Source of per-task and per-option parameter layers.
///
/// Task base parameters are the option layer of the `task` axis; a missing
/// task layer is fatal while a missing option layer is not.
pub trait ParameterSource {
    /// Base parameters of `task`. Fails when the task has no parameter file.
    fn task_parameters(&self, task: &str) -> Result<Parameters, SweepError>;

    /// Auxiliary parameters for `axis = value`, or `None` when there are none.
    fn option_parameters(
        &self,
        axis: &str,
        value: &ParamValue,
    ) -> Result<Option<Parameters>, SweepError>;
}

/// Parameter files laid out as `<root>/<axis>/<value>.params` (YAML).
#[derive(Debug, Clone)]
pub struct ParameterFiles {
    root: PathBuf,
}

impl ParameterFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the option file for `axis = label`.
    pub fn option_path(&self, axis: &str, label: &str) -> PathBuf {
        self.root
            .join(axis)
            .join(format!("{label}.{PARAMS_EXTENSION}"))
    }

    /// Loads one parameter file, merging its `_includes` first.
    pub fn load(&self, path: &Path) -> Result<Parameters, SweepError> {
        load_with_includes(path, 0)
    }
}

fn load_with_includes(path: &Path, depth: usize) -> Result<Parameters, SweepError> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(SweepError::Config(
            ErrorInfo::new("params-include-depth", "parameter includes nest too deeply")
                .with_context("path", path.display().to_string())
                .with_hint("check for include cycles"),
        ));
    }
    let bytes = fs::read(path).map_err(|err| {
        SweepError::Serde(
            ErrorInfo::new("params_read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    let raw: Value = from_yaml_slice(&bytes)?;
    let mut own = Parameters::from_value(raw)?;
    let includes = match own.remove(INCLUDES_KEY) {
        None => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(SweepError::Config(
                ErrorInfo::new("params-includes-invalid", "`_includes` must be a list of paths")
                    .with_context("path", path.display().to_string()),
            ))
        }
    };
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut merged = Parameters::new();
    for include in includes {
        let Some(relative) = include.as_str() else {
            return Err(SweepError::Config(
                ErrorInfo::new("params-includes-invalid", "`_includes` entries must be strings")
                    .with_context("path", path.display().to_string()),
            ));
        };
        let included = load_with_includes(&base_dir.join(relative), depth + 1)?;
        merged.unify_in_place(&included);
    }
    merged.unify_in_place(&own);
    Ok(merged)
}

impl ParameterSource for ParameterFiles {
    fn task_parameters(&self, task: &str) -> Result<Parameters, SweepError> {
        let path = self.option_path(TASK_AXIS, task);
        if !path.is_file() {
            return Err(SweepError::Config(
                ErrorInfo::new("task-params-missing", "task parameter file does not exist")
                    .with_context("task", task.to_string())
                    .with_context("path", path.display().to_string()),
            ));
        }
        self.load(&path)
    }

    fn option_parameters(
        &self,
        axis: &str,
        value: &ParamValue,
    ) -> Result<Option<Parameters>, SweepError> {
        if value.is_default() {
            return Ok(None);
        }
        let path = self.option_path(axis, &value.to_string());
        if !path.is_file() {
            debug!(axis, value = %value, path = %path.display(), "no option parameters");
            return Ok(None);
        }
        self.load(&path).map(Some)
    }
}

/// In-memory parameter layers keyed by `(axis, value label)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryParameters {
    layers: BTreeMap<(String, String), Parameters>,
}

impl InMemoryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the base parameters of `task`.
    pub fn with_task(self, task: &str, params: Parameters) -> Self {
        self.with_option(TASK_AXIS, task, params)
    }

    /// Registers the option layer for `axis = label`.
    pub fn with_option(mut self, axis: &str, label: &str, params: Parameters) -> Self {
        self.layers
            .insert((axis.to_string(), label.to_string()), params);
        self
    }
}

impl ParameterSource for InMemoryParameters {
    fn task_parameters(&self, task: &str) -> Result<Parameters, SweepError> {
        self.layers
            .get(&(TASK_AXIS.to_string(), task.to_string()))
            .cloned()
            .ok_or_else(|| {
                SweepError::Config(
                    ErrorInfo::new("task-params-missing", "no parameters registered for task")
                        .with_context("task", task.to_string()),
                )
            })
    }

    fn option_parameters(
        &self,
        axis: &str,
        value: &ParamValue,
    ) -> Result<Option<Parameters>, SweepError> {
        if value.is_default() {
            return Ok(None);
        }
        Ok(self
            .layers
            .get(&(axis.to_string(), value.to_string()))
            .cloned())
    }
}
