//! Job graph construction for sweeps.
//!
//! [`GraphBuilder`] turns a sweep configuration into slicing, training and
//! comparison jobs on any [`ExecutionEngine`]. [`WorkflowGraph`] is the
//! in-memory engine used by the command line and the tests.

mod artifact;
mod builder;
mod compare;
mod descriptor;
mod engine;
mod governor;
mod resources;
mod slices;
mod workflow;

pub use artifact::{dependencies_of, Artifact, JobHandle};
pub use builder::{
    BuildOutput, GraphBuilder, SweepPlan, TrainingPlan, MODEL_ROOT, PREDICTIONS_FILE,
    RESULTS_FILE, SLICE_AXIS,
};
pub use compare::{
    same_task_pairs, write_manifest, ComparisonScheduler, EvaluationRecord, ScheduledComparison,
    AGREEMENT_FILE, COMPARISON_ROOT, MANIFEST_FILE, SUMMARY_FILE,
};
pub use descriptor::{path_value, ComparisonRow, JobDescriptor, JobKind};
pub use engine::ExecutionEngine;
pub use governor::ResourceGovernor;
pub use resources::{ResourceRequest, DEFAULT_JOB_MINUTES};
pub use slices::{slice_locator, slice_name, slice_output_dir, SliceCache, SliceEntry, TaskInputs};
pub use workflow::{JobRecord, JobStatus, WorkflowDescription, WorkflowGraph};
