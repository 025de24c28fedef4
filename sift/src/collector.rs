//! Result collection: projection and sort entries in arrival order.

use serde_json::{Map, Value};

use crate::projection::{DisplayProjection, DISPLAY_NAME_KEY};
use crate::record::ResultRecord;
use crate::sort_key::{resolve_sort_value, SortKey};

/// Arrival index of a record paired with the value it sorts by.
#[derive(Debug, Clone, PartialEq)]
pub struct SortEntry {
    pub index: usize,
    pub key: Value,
}

/// Projected records and their sort entries, linked by position.
///
/// `records[i]` and `entries[i]` always describe the same record and
/// `entries[i].index == i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedResults {
    records: Vec<Value>,
    entries: Vec<SortEntry>,
}

impl CollectedResults {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn entries(&self) -> &[SortEntry] {
        &self.entries
    }

    pub(crate) fn into_parts(self) -> (Vec<Value>, Vec<SortEntry>) {
        (self.records, self.entries)
    }
}

/// Consumes the record stream one record at a time.
#[derive(Debug)]
pub struct ResultCollector<'a> {
    projection: &'a DisplayProjection,
    sort: Option<&'a SortKey>,
    results: CollectedResults,
}

impl<'a> ResultCollector<'a> {
    pub fn new(projection: &'a DisplayProjection, sort: Option<&'a SortKey>) -> Self {
        Self {
            projection,
            sort,
            results: CollectedResults::default(),
        }
    }

    /// Project a record, resolve its sort entry and append both.
    pub fn collect(&mut self, record: ResultRecord) {
        let index = self.results.records.len();
        let key = resolve_sort_value(&record, self.sort);
        let projected = match &record {
            ResultRecord::Map(map) => label_map_record(map),
            ResultRecord::Structured(object) => self.projection.project(object),
        };

        self.results.records.push(projected);
        self.results.entries.push(SortEntry { index, key });
    }

    pub fn count(&self) -> usize {
        self.results.len()
    }

    pub fn finish(self) -> CollectedResults {
        self.results
    }
}

/// Re-key a map record under its display name: `{label: rest_of_record}`.
fn label_map_record(map: &Map<String, Value>) -> Value {
    let label = match map.get(DISPLAY_NAME_KEY) {
        Some(Value::String(name)) => name.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    let mut rest = map.clone();
    rest.shift_remove(DISPLAY_NAME_KEY);

    let mut outer = Map::new();
    outer.insert(label, Value::Object(rest));
    Value::Object(outer)
}
