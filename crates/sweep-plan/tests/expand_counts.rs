use std::collections::BTreeSet;

use proptest::prelude::*;
use sweep_core::ParamValue;
use sweep_plan::{expand, Combination, ParameterAxis, ParameterSpace};

fn axis(name: &str, values: &[ParamValue]) -> ParameterAxis {
    ParameterAxis::new(name, values.to_vec())
}

#[test]
fn task_and_seed_expand_with_earlier_axes_slowest() {
    let space = ParameterSpace::new(vec![
        axis("task", &["A".into(), "B".into()]),
        axis("seed", &[1i64.into(), 2i64.into()]),
    ])
    .expect("space");
    let combos = space.combinations().expect("expand");
    let labels: Vec<String> = combos.iter().map(Combination::options_name).collect();
    assert_eq!(
        labels,
        vec!["task=A_seed=1", "task=A_seed=2", "task=B_seed=1", "task=B_seed=2"]
    );
    assert_eq!(combos[3].task().expect("task"), "B");
    assert_eq!(space.combination_count(), 4);
    assert_eq!(space.tasks(), vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn empty_axis_is_a_config_error() {
    let err = expand(&[axis("task", &["A".into()]), axis("lr", &[])]).unwrap_err();
    assert!(err.is_config());
    assert_eq!(err.info().code, "axis-empty");
    assert_eq!(err.info().context.get("axis").map(String::as_str), Some("lr"));

    let err = ParameterSpace::new(vec![axis("task", &[])]).unwrap_err();
    assert_eq!(err.info().code, "axis-empty");
}

#[test]
fn space_requires_a_task_axis() {
    let err = ParameterSpace::new(vec![axis("seed", &[1i64.into()])]).unwrap_err();
    assert_eq!(err.info().code, "axis-missing-task");
}

#[test]
fn combination_task_must_be_unique() {
    let missing = Combination::new(vec![("seed".into(), 1i64.into())]);
    assert_eq!(
        missing.task().unwrap_err().info().code,
        "combination-missing-task"
    );
    let doubled = Combination::new(vec![
        ("task".into(), "A".into()),
        ("task".into(), "B".into()),
    ]);
    assert_eq!(
        doubled.task().unwrap_err().info().code,
        "combination-ambiguous-task"
    );
}

#[test]
fn duplicates_are_not_removed() {
    let combos = expand(&[
        axis("task", &["A".into()]),
        axis("dropout", &[0.1f64.into(), 0.1f64.into()]),
    ])
    .expect("expand");
    assert_eq!(combos.len(), 2);
    assert_eq!(combos[0], combos[1]);
}

#[test]
fn sentinel_values_do_not_become_parameters() {
    let combo = Combination::new(vec![
        ("task".into(), "A".into()),
        ("architecture".into(), ParamValue::UseDefault),
        ("lr".into(), 0.5f64.into()),
    ]);
    let params = combo.to_parameters();
    assert!(!params.contains_key("architecture"));
    assert_eq!(params.get("lr"), Some(&serde_json::json!(0.5)));
    assert_eq!(combo.labels(), vec!["A", "_default", "0.5"]);
}

proptest! {
    #[test]
    fn product_of_axis_sizes(sizes in proptest::collection::vec(1usize..4, 1..5)) {
        let axes: Vec<ParameterAxis> = sizes
            .iter()
            .enumerate()
            .map(|(idx, size)| {
                let name = if idx == 0 { "task".to_string() } else { format!("axis{idx}") };
                ParameterAxis::new(name, (0..*size as i64).map(ParamValue::Int).collect())
            })
            .collect();
        let combos = expand(&axes).expect("expand");
        let expected: usize = sizes.iter().product();
        prop_assert_eq!(combos.len(), expected);

        let distinct: BTreeSet<String> = combos.iter().map(Combination::options_name).collect();
        prop_assert_eq!(distinct.len(), expected);
        for combo in &combos {
            prop_assert_eq!(combo.pairs().len(), axes.len());
            for (pair, axis) in combo.pairs().iter().zip(&axes) {
                prop_assert_eq!(&pair.0, &axis.name);
            }
        }
    }
}
