use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use sweep_core::serde::to_canonical_json_bytes;
use sweep_core::Locator;
use sweep_graph::{write_manifest, GraphBuilder, WorkflowDescription, WorkflowGraph};
use tracing::info;

use super::load_sweep;

pub const WORKFLOW_FILE: &str = "workflow.json";

#[derive(Args, Debug)]
pub struct CompileArgs {
    /// YAML sweep definition.
    #[arg(long)]
    pub params: PathBuf,
    /// Output directory for the workflow description.
    #[arg(long)]
    pub out: PathBuf,
    /// Root of the per-axis parameter files (defaults to `<project_root>/parameters`).
    #[arg(long)]
    pub params_root: Option<PathBuf>,
    /// File listing locators completed by earlier runs, one per line.
    #[arg(long)]
    pub history: Option<PathBuf>,
}

#[derive(Serialize)]
struct CompiledWorkflow<'a> {
    plan_hash: String,
    #[serde(flatten)]
    workflow: &'a WorkflowDescription,
}

pub fn run(args: &CompileArgs) -> Result<(), Box<dyn Error>> {
    let (config, files) = load_sweep(&args.params, args.params_root.as_deref())?;
    let history = match &args.history {
        Some(path) => read_history(path)?,
        None => Vec::new(),
    };
    let builder = GraphBuilder::new(&config, files)?;
    let output = builder.build(WorkflowGraph::new().with_history(history))?;

    fs::create_dir_all(&args.out)?;
    let document = CompiledWorkflow {
        plan_hash: config.plan_hash()?,
        workflow: &output.workflow,
    };
    fs::write(args.out.join(WORKFLOW_FILE), to_canonical_json_bytes(&document)?)?;
    if !output.comparisons.is_empty() {
        write_manifest(&output.manifest_path, &output.comparisons)?;
    }

    let pending = output.workflow.pending().count();
    info!(
        jobs = output.workflow.jobs.len(),
        pending,
        out = %args.out.display(),
        "workflow written"
    );
    println!(
        "{}",
        serde_json::json!({
            "plan_hash": document.plan_hash,
            "jobs": output.workflow.jobs.len(),
            "pending": pending,
            "comparisons": output.comparisons.len(),
        })
    );
    Ok(())
}

/// Reads `/`-separated locators; blank lines and `#` comments are skipped.
fn read_history(path: &Path) -> Result<Vec<Locator>, Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| Locator::new(line.split('/')))
        .collect())
}
