//! Deep merge of JSON fragments.
//!
//! Object-valued keys merge recursively and the incoming side wins on any
//! non-object conflict. Arrays are treated as plain values and replaced.

use serde_json::{Map, Value};

/// Merge `source` into `target`.
///
/// When both sides are objects their keys are merged; otherwise `target`
/// becomes a copy of `source`.
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            merge_object(target_map, source_map);
        }
        (target, source) => {
            *target = source.clone();
        }
    }
}

/// Merge every key of `source` into `target`.
pub fn merge_object(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, incoming) in source {
        let nested = incoming.is_object() && target.get(key).is_some_and(Value::is_object);
        if nested {
            if let Some(existing) = target.get_mut(key) {
                deep_merge(existing, incoming);
                continue;
            }
        }
        target.insert(key.clone(), incoming.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_objects_combine() {
        let mut target = json!({"user": {"ext": {"a": 1}, "id": "u1"}});
        deep_merge(&mut target, &json!({"user": {"ext": {"b": 2}}}));
        assert_eq!(target, json!({"user": {"ext": {"a": 1, "b": 2}, "id": "u1"}}));
    }

    #[test]
    fn test_incoming_scalar_wins() {
        let mut target = json!({"a": 1, "b": {"c": true}});
        deep_merge(&mut target, &json!({"a": 2, "b": "flat"}));
        assert_eq!(target, json!({"a": 2, "b": "flat"}));
    }

    #[test]
    fn test_object_replaces_scalar() {
        let mut target = json!({"a": 1});
        deep_merge(&mut target, &json!({"a": {"nested": 1}}));
        assert_eq!(target, json!({"a": {"nested": 1}}));
    }

    #[test]
    fn test_arrays_are_replaced() {
        let mut target = json!({"eids": [1, 2]});
        deep_merge(&mut target, &json!({"eids": [3]}));
        assert_eq!(target, json!({"eids": [3]}));
    }

    #[test]
    fn test_non_object_source_overwrites_target() {
        let mut target = json!({"a": 1});
        deep_merge(&mut target, &json!(null));
        assert_eq!(target, Value::Null);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let source = json!({"user": {"eids": [{"source": "tapad.com"}], "ext": {"k": "v"}}});
        let mut once = json!({"user": {"id": "u1"}});
        deep_merge(&mut once, &source);
        let mut twice = once.clone();
        deep_merge(&mut twice, &source);
        assert_eq!(once, twice);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| Value::from(n)),
            "[a-z]{0,6}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
                prop::collection::btree_map("[a-d]", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Merging the same source a second time changes nothing.
        #[test]
        fn prop_deep_merge_idempotent(target in arb_json(), source in arb_json()) {
            let mut once = target;
            deep_merge(&mut once, &source);
            let mut twice = once.clone();
            deep_merge(&mut twice, &source);
            prop_assert_eq!(once, twice);
        }

        /// Every top-level scalar of an object source ends up in the target.
        #[test]
        fn prop_source_scalars_win(target in arb_json(), source in arb_json()) {
            let mut merged = target;
            deep_merge(&mut merged, &source);
            if let Value::Object(source_map) = &source {
                for (key, value) in source_map {
                    if !value.is_object() {
                        prop_assert_eq!(merged.get(key), Some(value));
                    }
                }
            } else {
                prop_assert_eq!(&merged, &source);
            }
        }
    }
}
