use proptest::prelude::*;
use serde_json::json;
use sweep_core::{Locator, Parameters};

fn params(value: serde_json::Value) -> Parameters {
    Parameters::from_value(value).expect("mapping")
}

#[test]
fn unify_overwrites_scalars_and_merges_namespaces() {
    let base = params(json!({
        "lr": 0.01,
        "tags": ["a", "b"],
        "model": {"name": "roberta", "dropout": 0.1},
    }));
    let overlay = params(json!({
        "lr": 0.1,
        "tags": ["c"],
        "model": {"dropout": 0.3},
        "epochs": 3,
    }));
    let merged = base.unify(&overlay);
    assert_eq!(merged.get("lr"), Some(&json!(0.1)));
    assert_eq!(merged.get("tags"), Some(&json!(["c"])));
    assert_eq!(
        merged.get("model"),
        Some(&json!({"name": "roberta", "dropout": 0.3}))
    );
    assert_eq!(merged.get("epochs"), Some(&json!(3)));
    // left operand is untouched
    assert_eq!(base.get("lr"), Some(&json!(0.01)));
}

#[test]
fn scalar_replaces_namespace() {
    let base = params(json!({"model": {"name": "roberta"}}));
    let merged = base.unify(&params(json!({"model": "bert"})));
    assert_eq!(merged.get("model"), Some(&json!("bert")));
}

#[test]
fn typed_accessors_report_config_errors() {
    let p = params(json!({"minutes": 0, "name": 3, "time": 720, "partition": "gaia"}));
    assert_eq!(p.positive_integer("time").expect("time"), 720);
    assert_eq!(p.string("partition").expect("partition"), "gaia");
    assert_eq!(
        p.positive_integer("minutes").unwrap_err().info().code,
        "param-not-positive"
    );
    assert_eq!(p.string("name").unwrap_err().info().code, "param-not-string");
    let missing = p.positive_integer("absent").unwrap_err();
    assert!(missing.is_config());
    assert_eq!(missing.info().code, "param-missing");
    assert_eq!(p.optional_string("absent").expect("optional"), None);
}

#[test]
fn non_mapping_is_rejected() {
    let err = Parameters::from_value(json!([1, 2])).unwrap_err();
    assert_eq!(err.info().code, "params-not-mapping");
    assert!(Parameters::from_value(serde_json::Value::Null)
        .expect("null")
        .is_empty());
}

#[test]
fn locators_join_with_slashes() {
    let nested = Locator::new(["models", "A"]).child("slice_A_0_10");
    assert_eq!(nested.to_string(), "models/A/slice_A_0_10");
    assert_eq!(nested.segments().len(), 3);
}

proptest! {
    #[test]
    fn right_operand_wins_for_every_scalar_key(
        left in proptest::collection::btree_map("[a-e]", any::<i64>(), 0..5),
        right in proptest::collection::btree_map("[a-e]", any::<i64>(), 0..5),
    ) {
        let l: Parameters = left.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
        let r: Parameters = right.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
        let merged = l.unify(&r);
        for (key, value) in &right {
            prop_assert_eq!(merged.get(key), Some(&json!(value)));
        }
        for (key, value) in &left {
            if !right.contains_key(key) {
                prop_assert_eq!(merged.get(key), Some(&json!(value)));
            }
        }
    }
}
