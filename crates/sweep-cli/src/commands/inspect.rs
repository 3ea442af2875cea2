use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use sweep_core::serde::to_yaml_string;
use sweep_graph::{GraphBuilder, ResourceRequest};

use super::load_sweep;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// YAML sweep definition.
    #[arg(long)]
    pub params: PathBuf,
    /// Root of the per-axis parameter files (defaults to `<project_root>/parameters`).
    #[arg(long)]
    pub params_root: Option<PathBuf>,
}

#[derive(Serialize)]
struct AxisSummary {
    name: String,
    values: Vec<String>,
}

#[derive(Serialize)]
struct OverrideSummary {
    name: String,
    generality: usize,
    keys: Vec<String>,
}

#[derive(Serialize)]
struct RunSummary {
    locator: String,
    save_path: PathBuf,
    resources: ResourceRequest,
}

#[derive(Serialize)]
struct Inspection {
    plan_hash: String,
    combinations: usize,
    axes: Vec<AxisSummary>,
    overrides: Vec<OverrideSummary>,
    training: Vec<RunSummary>,
}

pub fn run(args: &InspectArgs) -> Result<(), Box<dyn Error>> {
    let (config, files) = load_sweep(&args.params, args.params_root.as_deref())?;
    let builder = GraphBuilder::new(&config, files)?;
    let space = builder.space();
    let plan = builder.plan()?;

    let inspection = Inspection {
        plan_hash: config.plan_hash()?,
        combinations: space.combination_count(),
        axes: space
            .axes()
            .iter()
            .map(|axis| AxisSummary {
                name: axis.name.clone(),
                values: axis.values.iter().map(|value| value.label()).collect(),
            })
            .collect(),
        overrides: builder
            .overrides()
            .entries()
            .iter()
            .map(|entry| OverrideSummary {
                name: entry.name.clone(),
                generality: entry.generality(space),
                keys: entry.payload.iter().map(|(key, _)| key.clone()).collect(),
            })
            .collect(),
        training: plan
            .training
            .into_iter()
            .map(|run| RunSummary {
                locator: run.locator.to_string(),
                save_path: run.save_path,
                resources: run.resources,
            })
            .collect(),
    };
    print!("{}", to_yaml_string(&inspection)?);
    Ok(())
}
