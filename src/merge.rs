//! One-level option merging.
//!
//! Sources are applied left to right, so later sources win. For every key:
//! - two sequences concatenate
//! - two mappings merge exactly one level deep (nested values are overwritten)
//! - anything else is replaced by the later value, including type mismatches
//!
//! `null` is a real value and overwrites. A missing key never overwrites.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::hash::Hash;

/// Merges `sources` into a fresh map.
#[must_use]
pub fn merge_maps<'a, I>(sources: I) -> Map<String, Value>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let mut result = Map::new();
    for source in sources {
        merge_into(&mut result, source);
    }
    result
}

/// Merges `source` into `target` in place.
pub fn merge_into(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match value {
            Value::Array(items) => {
                if let Some(Value::Array(existing)) = target.get_mut(key) {
                    existing.extend(items.iter().cloned());
                } else {
                    target.insert(key.clone(), Value::Array(items.clone()));
                }
            }
            Value::Object(entries) => {
                if let Some(Value::Object(existing)) = target.get_mut(key) {
                    for (k, v) in entries {
                        existing.insert(k.clone(), v.clone());
                    }
                } else {
                    target.insert(key.clone(), Value::Object(entries.clone()));
                }
            }
            other => {
                target.insert(key.clone(), other.clone());
            }
        }
    }
}

/// Merges a single value over an accumulator using the same rules as [`merge_into`].
#[must_use]
pub fn merge_value(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Array(a), Value::Array(b)) => Value::Array(a.iter().chain(b).cloned().collect()),
        (Value::Object(a), Value::Object(b)) => {
            let mut merged = a.clone();
            for (k, v) in b {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        (_, other) => other.clone(),
    }
}

/// Typed counterpart of [`merge_into`] used to layer option structs.
pub trait Assign {
    /// Applies `other` on top of `self`.
    fn assign(&mut self, other: &Self);
}

impl<T: Clone> Assign for Vec<T> {
    fn assign(&mut self, other: &Self) {
        self.extend(other.iter().cloned());
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Assign for IndexMap<K, V> {
    fn assign(&mut self, other: &Self) {
        for (k, v) in other {
            self.insert(k.clone(), v.clone());
        }
    }
}

impl<T: Clone> Assign for Option<T> {
    fn assign(&mut self, other: &Self) {
        if other.is_some() {
            self.clone_from(other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_null_overwrites() {
        let a = obj(json!({"sub": "foo"}));
        let b = obj(json!({"sub": null}));
        assert_eq!(Value::Object(merge_maps([&a, &b])), json!({"sub": null}));
    }

    #[test]
    fn test_merges_objects_one_level() {
        let a = obj(json!({"sub": {"foo": "foo"}}));
        let b = obj(json!({"sub": {"bar": "bar"}}));
        assert_eq!(
            Value::Object(merge_maps([&a, &b])),
            json!({"sub": {"foo": "foo", "bar": "bar"}})
        );
    }

    #[test]
    fn test_nested_values_are_overwritten_not_merged() {
        let a = obj(json!({"sub": {"inner": {"x": 1}, "list": [1]}}));
        let b = obj(json!({"sub": {"inner": {"y": 2}, "list": [2]}}));
        assert_eq!(
            Value::Object(merge_maps([&a, &b])),
            json!({"sub": {"inner": {"y": 2}, "list": [2]}})
        );
    }

    #[test]
    fn test_concatenates_arrays() {
        let a = obj(json!({"sub": ["foo"]}));
        let b = obj(json!({"sub": ["bar"]}));
        assert_eq!(
            Value::Object(merge_maps([&a, &b])),
            json!({"sub": ["foo", "bar"]})
        );
    }

    #[test]
    fn test_last_wins_on_type_mismatch() {
        let a = obj(json!({"sub": {"foo": "foo"}}));
        let b = obj(json!({"sub": ["bar"]}));
        assert_eq!(Value::Object(merge_maps([&a, &b])), json!({"sub": ["bar"]}));
        assert_eq!(
            Value::Object(merge_maps([&b, &a])),
            json!({"sub": {"foo": "foo"}})
        );
    }

    #[test]
    fn test_sources_are_not_mutated() {
        let a = obj(json!({"sub": {"foo": 1}, "list": [1]}));
        let b = obj(json!({"sub": {"bar": 2}, "list": [2]}));
        let _ = merge_maps([&a, &b]);
        assert_eq!(Value::Object(a), json!({"sub": {"foo": 1}, "list": [1]}));
    }

    #[test]
    fn test_merge_value() {
        assert_eq!(merge_value(&json!([1]), &json!([2])), json!([1, 2]));
        assert_eq!(merge_value(&json!({"a": 1}), &json!("x")), json!("x"));
    }

    #[test]
    fn test_assign_option_and_vec() {
        let mut timeout = Some(1);
        timeout.assign(&None);
        assert_eq!(timeout, Some(1));
        timeout.assign(&Some(5));
        assert_eq!(timeout, Some(5));

        let mut hooks = vec!["a"];
        hooks.assign(&vec!["b"]);
        assert_eq!(hooks, vec!["a", "b"]);
    }
}
