use std::fs;
use std::path::Path;

use serde_json::json;
use sweep_core::ParamValue;
use sweep_plan::{load_config, ParameterFiles, ParameterSource, SliceOption};
use tempfile::tempdir;

const CONFIG: &str = r#"
experiment_root: out
project_root: .
partition: gaia
job_time_in_minutes: 720
slice_options:
  - {seed: 0, percent: 10}
  - {seed: 1, percent: 50}
parameter_options:
  task: [physicaliqa, alphanli]
  architecture: ['', custom]
  random_seed: [0, 1]
training_overrides:
  zeta:
    parameter_options: [task]
    task: alphanli
    lr: 0.1
  alpha:
    batch_size: 8
model:
  name: roberta
train:
  max_epochs: 3
"#;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, contents).expect("write");
}

#[test]
fn config_keeps_declaration_order_and_globals() {
    let dir = tempdir().expect("tmp dir");
    let path = dir.path().join("sweep.params");
    write(&path, CONFIG);
    let config = load_config(&path).expect("config loads");

    let axes: Vec<&str> = config.parameter_options.keys().map(String::as_str).collect();
    assert_eq!(axes, vec!["task", "architecture", "random_seed"]);
    assert_eq!(
        config.parameter_options["architecture"],
        vec![ParamValue::UseDefault, ParamValue::Str("custom".into())]
    );
    let overrides: Vec<&str> = config.training_overrides.keys().map(String::as_str).collect();
    assert_eq!(overrides, vec!["zeta", "alpha"]);

    assert_eq!(config.training_partition, "mics");
    assert_eq!(config.max_jobs_on_mics, 2);
    assert_eq!(config.slice_options[1], SliceOption::new(1, 50));
    assert_eq!(config.global().positive_integer("job_time_in_minutes").expect("time"), 720);
    assert_eq!(config.experiment_root(), dir.path().join("out"));
    assert_eq!(config.params_root(), dir.path().join(".").join("parameters"));

    let space = config.space().expect("space");
    assert_eq!(space.combination_count(), 8);
    let table = config.overrides(&space).expect("overrides");
    assert_eq!(table.entries()[0].name, "alpha");
    assert_eq!(config.plan_hash().expect("hash"), config.plan_hash().expect("hash"));
}

#[test]
fn empty_slice_options_are_rejected() {
    let dir = tempdir().expect("tmp dir");
    let path = dir.path().join("sweep.params");
    write(&path, &CONFIG.replace(
        "  - {seed: 0, percent: 10}\n  - {seed: 1, percent: 50}\n",
        "",
    ).replace("slice_options:\n", "slice_options: []\n"));
    let err = load_config(&path).unwrap_err();
    assert!(err.is_config());
    assert_eq!(err.info().code, "slice-options-empty");
}

#[test]
fn option_files_merge_includes_and_missing_ones_are_skipped() {
    let dir = tempdir().expect("tmp dir");
    let root = dir.path().join("parameters");
    write(&root.join("root.params"), "partition: default\nnum_gpus: 1\n");
    write(
        &root.join("task").join("alphanli.params"),
        "_includes: [../root.params]\ntrain_x: data/alphanli/train.jsonl\ntrain_y: data/alphanli/train-labels.lst\nval_y: data/alphanli/dev-labels.lst\nnum_gpus: 2\n",
    );
    write(&root.join("architecture").join("custom.params"), "hidden: 512\n");

    let files = ParameterFiles::new(&root);
    let task = files.task_parameters("alphanli").expect("task params");
    assert_eq!(task.get("partition"), Some(&json!("default")));
    assert_eq!(task.get("num_gpus"), Some(&json!(2)));
    assert!(!task.contains_key("_includes"));

    let custom = files
        .option_parameters("architecture", &"custom".into())
        .expect("lookup");
    assert_eq!(custom.and_then(|p| p.get("hidden").cloned()), Some(json!(512)));

    let absent = files
        .option_parameters("architecture", &"transformer_xl".into())
        .expect("missing option file is not an error");
    assert!(absent.is_none());
    let sentinel = files
        .option_parameters("architecture", &ParamValue::UseDefault)
        .expect("sentinel lookup");
    assert!(sentinel.is_none());

    let err = files.task_parameters("hellaswag").unwrap_err();
    assert!(err.is_config());
    assert_eq!(err.info().code, "task-params-missing");
}

#[test]
fn include_cycles_are_reported() {
    let dir = tempdir().expect("tmp dir");
    let a = dir.path().join("a.params");
    write(&a, "_includes: [b.params]\nx: 1\n");
    write(&dir.path().join("b.params"), "_includes: [a.params]\ny: 2\n");
    let err = ParameterFiles::new(dir.path()).load(&a).unwrap_err();
    assert_eq!(err.info().code, "params-include-depth");
}

#[test]
fn option_files_for_booleans_and_floats_use_established_names() {
    let dir = tempdir().expect("tmp dir");
    let root = dir.path().join("parameters");
    write(&root.join("use_crf").join("True.params"), "crf_dim: 64\n");
    write(&root.join("lr").join("1e-05.params"), "warmup: 100\n");

    let files = ParameterFiles::new(&root);
    let crf = files
        .option_parameters("use_crf", &ParamValue::Bool(true))
        .expect("lookup")
        .expect("True.params found");
    assert_eq!(crf.get("crf_dim"), Some(&json!(64)));
    let lr = files
        .option_parameters("lr", &ParamValue::Float(1e-5))
        .expect("lookup")
        .expect("1e-05.params found");
    assert_eq!(lr.get("warmup"), Some(&json!(100)));
    assert_eq!(
        files.option_path("use_crf", &ParamValue::Bool(false).label()),
        root.join("use_crf").join("False.params")
    );
}
