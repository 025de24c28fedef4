//! Output ordering.
//!
//! Sort keys are compared as numbers when every key is numeric, as strings
//! when every key is a string, and otherwise every key is coerced to a string
//! (`null` becomes `""`, other non-strings their compact JSON form). Equal
//! keys keep arrival order.

use std::cmp::Ordering;

use serde_json::Value;

use crate::collector::{CollectedResults, SortEntry};

/// How a batch of sort keys is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyClass {
    Numeric,
    Text,
    Mixed,
}

fn classify(entries: &[SortEntry]) -> KeyClass {
    if entries.iter().all(|e| e.key.is_number()) {
        KeyClass::Numeric
    } else if entries.iter().all(|e| e.key.is_string()) {
        KeyClass::Text
    } else {
        KeyClass::Mixed
    }
}

fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn compare_keys(a: &Value, b: &Value, class: KeyClass) -> Ordering {
    match class {
        KeyClass::Numeric => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.total_cmp(&b)
        }
        KeyClass::Text => a.as_str().unwrap_or_default().cmp(b.as_str().unwrap_or_default()),
        KeyClass::Mixed => coerce_to_string(a).cmp(&coerce_to_string(b)),
    }
}

/// Arrival indices in emission order.
pub fn emission_order(entries: &[SortEntry], sorted: bool) -> Vec<usize> {
    let mut ordered: Vec<&SortEntry> = entries.iter().collect();
    if sorted {
        let class = classify(entries);
        ordered.sort_by(|a, b| compare_keys(&a.key, &b.key, class).then(a.index.cmp(&b.index)));
    }
    ordered.into_iter().map(|e| e.index).collect()
}

/// Consume collected results and yield projected records in emission order.
pub fn sequence(results: CollectedResults, sorted: bool) -> Vec<Value> {
    let order = emission_order(results.entries(), sorted);
    let (records, _) = results.into_parts();
    let mut slots: Vec<Option<Value>> = records.into_iter().map(Some).collect();

    order
        .into_iter()
        .filter_map(|index| slots.get_mut(index).and_then(Option::take))
        .collect()
}
