use easystore::path;
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn arb_key() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

fn arb_keys() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(arb_key(), 1..6)
}

/// Nest `leaf` under `keys`, outermost key first.
fn nest(keys: &[String], leaf: Value) -> Value {
    keys.iter().rev().fold(leaf, |inner, key| {
        let mut map = Map::new();
        map.insert(key.clone(), inner);
        Value::Object(map)
    })
}

// Whatever value is nested under a path is found again under that path.
proptest! {
    #[test]
    fn prop_nested_value_is_found(keys in arb_keys(), leaf in any::<i64>()) {
        let root = nest(&keys, json!(leaf));
        let joined = keys.join(".");
        prop_assert_eq!(path::get(&root, &joined).cloned(), Some(json!(leaf)));
    }
}

// Extending a path past a scalar leaf, or diverging from it, never panics and
// always falls back to the default.
proptest! {
    #[test]
    fn prop_missing_path_falls_back(
        keys in arb_keys(),
        extra in arb_key(),
        leaf in any::<i64>(),
    ) {
        let root = nest(&keys, json!(leaf));

        let deeper = format!("{}.{}", keys.join("."), extra);
        prop_assert_eq!(path::get_or(&root, &deeper, json!("default")), json!("default"));

        let mut diverged = keys.clone();
        diverged[0] = format!("{}_", diverged[0]);
        prop_assert_eq!(path::get(&root, &diverged.join(".")), None);
    }
}
