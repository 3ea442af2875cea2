//! Sweep definitions: configuration loading, parameter spaces, combination
//! expansion, override resolution and parameter file lookup.

mod config;
mod files;
mod overrides;
mod space;

pub use config::{load_config, SliceOption, SweepConfig};
pub use files::{InMemoryParameters, ParameterFiles, ParameterSource, INCLUDES_KEY, PARAMS_EXTENSION};
pub use overrides::{
    resolve, sort_by_generality, AxisConstraint, Override, OverrideTable, PARAMETER_OPTIONS_KEY,
};
pub use space::{expand, Combination, ParameterAxis, ParameterSpace, TASK_AXIS};
