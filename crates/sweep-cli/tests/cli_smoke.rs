use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::tempdir;

const SWEEP: &str = r#"
experiment_root: experiments
project_root: .
partition: gaia
job_time_in_minutes: 60
slice_options:
  - {seed: 0, percent: 50}
parameter_options:
  task: [alphanli]
  random_seed: [0, 1, 2]
training_overrides:
  small_batches:
    parameter_options: [task]
    task: alphanli
    batch_size: 4
"#;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, contents).expect("write");
}

fn project(root: &Path) {
    write(&root.join("sweep.params"), SWEEP);
    write(
        &root.join("parameters").join("task").join("alphanli.params"),
        "train_x: data/train.jsonl\ntrain_y: data/train-labels.lst\nval_y: data/dev-labels.lst\n",
    );
}

fn sweepc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sweepc"))
        .args(args)
        .output()
        .expect("run sweepc")
}

#[test]
fn compile_writes_workflow_and_manifest() {
    let dir = tempdir().expect("tmp dir");
    project(dir.path());
    let params = dir.path().join("sweep.params");
    let out = dir.path().join("build");

    let output = sweepc(&[
        "compile",
        "--params",
        params.to_str().expect("utf8"),
        "--out",
        out.to_str().expect("utf8"),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let summary: Value = serde_json::from_slice(&output.stdout).expect("json summary");
    // 2 slice jobs, 3 training runs, 3 comparisons, 1 summary.
    assert_eq!(summary["jobs"], 9);
    assert_eq!(summary["comparisons"], 3);

    let workflow: Value =
        serde_json::from_slice(&fs::read(out.join("workflow.json")).expect("workflow.json"))
            .expect("workflow json");
    assert_eq!(workflow["plan_hash"], summary["plan_hash"]);
    assert_eq!(workflow["concurrency_limits"]["mics"], 2);
    let train = workflow["jobs"]
        .as_array()
        .expect("jobs")
        .iter()
        .find(|job| job["kind"] == "train")
        .expect("training job");
    assert_eq!(train["parameters"]["batch_size"], 4);

    let manifest = fs::read_to_string(
        dir.path()
            .join("experiments")
            .join("percent_agreement")
            .join("comparisons.jsonl"),
    )
    .expect("manifest");
    assert_eq!(manifest.lines().count(), 3);
}

#[test]
fn history_reduces_pending_jobs() {
    let dir = tempdir().expect("tmp dir");
    project(dir.path());
    let history = dir.path().join("done.txt");
    write(
        &history,
        "# finished last time\nslice/alphanli/0_50/x\nslice/alphanli/0_50/y\nmodels/alphanli/0/slice_alphanli_0_50\n",
    );
    let params = dir.path().join("sweep.params");
    let out = dir.path().join("build");
    let output = sweepc(&[
        "compile",
        "--params",
        params.to_str().expect("utf8"),
        "--out",
        out.to_str().expect("utf8"),
        "--history",
        history.to_str().expect("utf8"),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let summary: Value = serde_json::from_slice(&output.stdout).expect("json summary");
    assert_eq!(summary["pending"], 6);
}

#[test]
fn inspect_lists_resolved_runs() {
    let dir = tempdir().expect("tmp dir");
    project(dir.path());
    let params = dir.path().join("sweep.params");
    let output = sweepc(&["inspect", "--params", params.to_str().expect("utf8")]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let text = String::from_utf8(output.stdout).expect("utf8");
    assert!(text.contains("combinations: 3"));
    assert!(text.contains("models/alphanli/2/slice_alphanli_0_50"));
    assert!(text.contains("small_batches"));
}

#[test]
fn config_errors_fail_without_output() {
    let dir = tempdir().expect("tmp dir");
    project(dir.path());
    fs::remove_file(dir.path().join("parameters").join("task").join("alphanli.params"))
        .expect("remove task params");
    let params = dir.path().join("sweep.params");
    let out = dir.path().join("build");
    let output = sweepc(&[
        "-q",
        "compile",
        "--params",
        params.to_str().expect("utf8"),
        "--out",
        out.to_str().expect("utf8"),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("task-params-missing"));
    assert!(!out.join("workflow.json").exists());
}
