//! Sort-key resolution over heterogeneous records.
//!
//! Records come in two shapes, and the requested key may live at the top level,
//! somewhere below it, or behind an object accessor. Resolution order:
//!
//! 1. Map records: a direct top-level key wins even when its value is falsy;
//!    otherwise a depth-first search in key order returns the first truthy
//!    nested match.
//! 2. Structured records: a named accessor wins; otherwise the dotted path is
//!    looked up in the map view (`null` or `false` there counts as absent); otherwise the same path is tried inside every
//!    top-level nested map, first truthy result wins.
//!
//! Anything unresolved sorts as the empty string.

use serde_json::{Map, Value};

use crate::record::{dig, ChefObject, ResultRecord};

/// A requested sort key and its dotted path form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub key: String,
    pub path: Vec<String>,
}

impl SortKey {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let path = key.split('.').map(str::to_string).collect();
        Self { key, path }
    }
}

/// Value used for records that have nothing to sort by.
pub fn empty_sort_value() -> Value {
    Value::String(String::new())
}

/// Resolve the value a record sorts by.
pub fn resolve_sort_value(record: &ResultRecord, sort: Option<&SortKey>) -> Value {
    let Some(sort) = sort else {
        return empty_sort_value();
    };

    let resolved = match record {
        ResultRecord::Map(map) => search_map(map, &sort.key),
        ResultRecord::Structured(object) => resolve_structured(object, sort),
    };

    resolved.unwrap_or_else(empty_sort_value)
}

/// Direct key first (value returned as-is), then depth-first through nested maps.
fn search_map(map: &Map<String, Value>, key: &str) -> Option<Value> {
    if let Some(value) = map.get(key) {
        return Some(value.clone());
    }

    map.values()
        .filter_map(Value::as_object)
        .filter_map(|nested| search_map(nested, key))
        .find(is_truthy)
}

fn resolve_structured(object: &ChefObject, sort: &SortKey) -> Option<Value> {
    if let Some(value) = object.field(&sort.key) {
        return Some(value);
    }

    let map = object.to_map();
    if let Some(value) = dig(&map, &sort.path)
        .filter(|value| !matches!(value, Value::Null | Value::Bool(false)))
    {
        return Some(value.clone());
    }

    map.values()
        .filter_map(Value::as_object)
        .filter_map(|nested| dig(nested, &sort.path))
        .find(|value| is_truthy(value))
        .cloned()
}

/// `null`, `false`, zero, and empty strings, arrays and objects are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
