use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sweep_core::errors::{ErrorInfo, SweepError};
use sweep_core::serde::from_yaml_slice;
use sweep_core::{stable_hash_string, ParamValue, Parameters};

use crate::overrides::OverrideTable;
use crate::space::ParameterSpace;

fn io_error(code: &str, path: &Path, err: impl ToString) -> SweepError {
    SweepError::Serde(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

/// Random subset of a task's training data, identified by seed and percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SliceOption {
    /// Seed forwarded to the slicing job.
    pub seed: u64,
    /// Percentage of training records to keep, in `1..=100`.
    pub percent: u32,
}

impl SliceOption {
    pub fn new(seed: u64, percent: u32) -> Self {
        Self { seed, percent }
    }

    /// Fraction of records handed to the slicing job.
    pub fn fraction(&self) -> f64 {
        f64::from(self.percent) / 100.0
    }

    /// `<seed>_<percent>` identity used in locators and combination labels.
    pub fn label(&self) -> String {
        format!("{}_{}", self.seed, self.percent)
    }
}

/// Top level sweep definition loaded from a YAML parameters file.
///
/// Keys not modelled here stay available through [`SweepConfig::global`],
/// which also feeds resource requests (`job_time_in_minutes`, `num_gpus`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Directory receiving slices, model outputs and comparison summaries.
    pub experiment_root: PathBuf,
    /// Repository root; parameter files live under `<project_root>/parameters`.
    pub project_root: PathBuf,
    /// Partition enforced on every training job's parameters.
    pub partition: String,
    /// Queue training jobs are routed to and capped on.
    #[serde(default = "default_training_partition")]
    pub training_partition: String,
    /// Concurrency cap for the training queue.
    #[serde(default = "default_max_jobs_on_mics")]
    pub max_jobs_on_mics: usize,
    /// Slices trained for every combination.
    pub slice_options: Vec<SliceOption>,
    /// Sweep axes in declaration order.
    pub parameter_options: IndexMap<String, Vec<ParamValue>>,
    /// Conditional patches in declaration order.
    #[serde(default)]
    pub training_overrides: IndexMap<String, Value>,
    /// Shared model defaults, nested under `model` in job parameters.
    #[serde(default)]
    pub model: Parameters,
    /// Shared training defaults, merged at the top level of job parameters.
    #[serde(default)]
    pub train: Parameters,
    /// Directory containing the configuration file (ignored when serializing).
    #[serde(skip)]
    pub base_dir: PathBuf,
    #[serde(skip)]
    global: Parameters,
}

fn default_training_partition() -> String {
    "mics".to_string()
}

fn default_max_jobs_on_mics() -> usize {
    2
}

impl SweepConfig {
    /// Parses a configuration document; relative paths resolve against `base_dir`.
    pub fn from_yaml_slice(bytes: &[u8], base_dir: impl Into<PathBuf>) -> Result<Self, SweepError> {
        let mut config: SweepConfig = from_yaml_slice(bytes)?;
        let raw: Value = from_yaml_slice(bytes)?;
        config.global = Parameters::from_value(raw)?;
        config.base_dir = base_dir.into();
        config.validate()?;
        Ok(config)
    }

    /// Every key of the configuration document.
    pub fn global(&self) -> &Parameters {
        &self.global
    }

    pub fn experiment_root(&self) -> PathBuf {
        self.resolve(&self.experiment_root)
    }

    pub fn project_root(&self) -> PathBuf {
        self.resolve(&self.project_root)
    }

    /// Root of the per-axis parameter file tree.
    pub fn params_root(&self) -> PathBuf {
        self.project_root().join("parameters")
    }

    /// Validated parameter space built from `parameter_options`.
    pub fn space(&self) -> Result<ParameterSpace, SweepError> {
        ParameterSpace::from_options(&self.parameter_options)
    }

    /// Override table sorted for `space`.
    pub fn overrides(&self, space: &ParameterSpace) -> Result<OverrideTable, SweepError> {
        OverrideTable::from_config(&self.training_overrides, space)
    }

    /// Stable hash of the whole configuration document.
    pub fn plan_hash(&self) -> Result<String, SweepError> {
        stable_hash_string(&self.global)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn validate(&self) -> Result<(), SweepError> {
        if self.slice_options.is_empty() {
            return Err(SweepError::Config(
                ErrorInfo::new("slice-options-empty", "at least one slice option is required")
                    .with_hint("add `slice_options: [{seed: 0, percent: 100}]`"),
            ));
        }
        if let Some(option) = self
            .slice_options
            .iter()
            .find(|option| option.percent == 0 || option.percent > 100)
        {
            return Err(SweepError::Config(
                ErrorInfo::new("slice-percent-range", "slice percent must lie in 1..=100")
                    .with_context("percent", option.percent.to_string()),
            ));
        }
        if self.max_jobs_on_mics == 0 {
            return Err(SweepError::Config(ErrorInfo::new(
                "concurrency-zero",
                "max_jobs_on_mics must be positive",
            )));
        }
        Ok(())
    }
}

/// Loads a sweep configuration from disk.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SweepConfig, SweepError> {
    let config_path = path.as_ref();
    let bytes = fs::read(config_path).map_err(|err| io_error("config_read", config_path, err))?;
    let base_dir = config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    SweepConfig::from_yaml_slice(&bytes, base_dir)
}
