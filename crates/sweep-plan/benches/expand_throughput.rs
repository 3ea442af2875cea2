use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use sweep_core::{ParamValue, Parameters};
use sweep_plan::{resolve, Override, OverrideTable, ParameterAxis, ParameterSpace};

fn make_space() -> ParameterSpace {
    ParameterSpace::new(vec![
        ParameterAxis::new("task", vec!["alphanli".into(), "hellaswag".into()]),
        ParameterAxis::new(
            "architecture",
            vec![ParamValue::UseDefault, "custom".into(), "wide".into()],
        ),
        ParameterAxis::new("random_seed", (0..8).map(ParamValue::Int).collect()),
        ParameterAxis::new("lr", vec![0.1f64.into(), 0.01f64.into(), 0.001f64.into()]),
    ])
    .expect("space")
}

fn bench_expand(c: &mut Criterion) {
    let space = make_space();
    c.bench_function("expand_throughput", |b| {
        b.iter(|| {
            let _ = space.combinations().expect("expand");
        });
    });
}

fn bench_resolve(c: &mut Criterion) {
    let space = make_space();
    let combos = space.combinations().expect("expand");
    let overrides: Vec<Override> = ["alphanli", "hellaswag"]
        .iter()
        .map(|task| {
            Override::from_value(
                task,
                &json!({"parameter_options": ["task"], "task": task, "batch_size": 4}),
                &space,
            )
            .expect("override")
        })
        .collect();
    let table = OverrideTable::new(overrides, &space);
    let base = Parameters::from_pairs([("batch_size", json!(16))]);
    c.bench_function("resolve_throughput", |b| {
        b.iter(|| {
            for combo in &combos {
                let _ = resolve(&base, combo, &table);
            }
        });
    });
}

criterion_group!(benches, bench_expand, bench_resolve);
criterion_main!(benches);
