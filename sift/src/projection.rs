//! Projection specs and display projection of structured records.
//!
//! A projection maps output names to attribute paths:
//!
//! ```text
//! -f "env=chef_environment, ruby=languages.ruby.version"
//!   => {"env": ["chef_environment"], "ruby": ["languages", "ruby", "version"]}
//! ```
//!
//! The same projection is sent to the server for partial search and used
//! locally to shape structured records.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::record::{dig, dig_value, ChefObject};
use crate::{Error, Result};

/// Reserved output name carrying the record's label.
pub const DISPLAY_NAME_KEY: &str = "__display_name";

/// Ordered mapping of output names to attribute paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionSpec {
    entries: Vec<(String, Vec<String>)>,
}

impl ProjectionSpec {
    /// Parse a filter expression such as `"name=path.to.a, other=b"`.
    ///
    /// Whitespace is ignored everywhere; empty clauses are skipped.
    pub fn from_filter_string(filter: &str) -> Result<Self> {
        let compact: String = filter.chars().filter(|c| !c.is_whitespace()).collect();
        let mut spec = Self::default();

        for clause in compact.split(',').filter(|clause| !clause.is_empty()) {
            let (name, path) = clause.split_once('=').ok_or_else(|| Error::Format {
                clause: clause.to_string(),
                reason: "expected name=path".to_string(),
            })?;

            if name.is_empty() {
                return Err(Error::Format {
                    clause: clause.to_string(),
                    reason: "empty output name".to_string(),
                });
            }
            if path.is_empty() {
                return Err(Error::Format {
                    clause: clause.to_string(),
                    reason: "empty attribute path".to_string(),
                });
            }

            let segments = split_path(path);
            if segments.iter().any(String::is_empty) {
                return Err(Error::Format {
                    clause: clause.to_string(),
                    reason: "empty path segment".to_string(),
                });
            }

            spec.insert(name, segments);
        }

        Ok(spec)
    }

    /// Build a projection where each dotted attribute names itself.
    ///
    /// The label mapping `__display_name => ["name"]` is always added so the
    /// record name survives whatever attributes were asked for.
    pub fn from_attributes<S: AsRef<str>>(attributes: &[S]) -> Self {
        let mut spec = Self::default();
        for attribute in attributes {
            let attribute = attribute.as_ref();
            spec.insert(attribute, split_path(attribute));
        }
        spec.insert(DISPLAY_NAME_KEY, vec!["name".to_string()]);
        spec
    }

    /// Pick the projection for a run: filter string first, then attributes.
    pub fn from_options<S: AsRef<str>>(filter: Option<&str>, attributes: &[S]) -> Result<Option<Self>> {
        if let Some(filter) = filter {
            return Self::from_filter_string(filter).map(Some);
        }
        if !attributes.is_empty() {
            return Ok(Some(Self::from_attributes(attributes)));
        }
        Ok(None)
    }

    /// Insert or replace an output; replacing keeps the original position.
    fn insert(&mut self, name: &str, path: Vec<String>) {
        match self.entries.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = path,
            None => self.entries.push((name.to_string(), path)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, path)| path.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(name, path)| (name.as_str(), path.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply the projection to a map; missing paths become `null`.
    pub fn extract(&self, source: &Map<String, Value>) -> Map<String, Value> {
        self.iter()
            .map(|(name, path)| {
                let value = dig(source, path).cloned().unwrap_or(Value::Null);
                (name.to_string(), value)
            })
            .collect()
    }
}

impl Serialize for ProjectionSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, path) in &self.entries {
            map.serialize_entry(name, path)?;
        }
        map.end()
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

/// How structured records are shaped before rendering.
#[derive(Debug, Clone, Default)]
pub struct DisplayProjection {
    /// Named outputs to extract (`{label: {output: value}}`).
    pub spec: Option<ProjectionSpec>,
    /// Show only the run list.
    pub run_list: bool,
    /// Show only the record's name.
    pub id_only: bool,
}

impl DisplayProjection {
    /// Shape one structured record.
    pub fn project(&self, object: &ChefObject) -> Value {
        if let Some(spec) = &self.spec {
            let subset: Map<String, Value> = spec
                .iter()
                .filter(|(name, _)| *name != DISPLAY_NAME_KEY)
                .map(|(name, path)| (name.to_string(), extract_nested(object, path)))
                .collect();
            return labelled(object, Value::Object(subset));
        }

        if self.run_list {
            let run_list = object.run_list().into_iter().map(Value::String).collect();
            let mut subset = Map::new();
            subset.insert("run_list".to_string(), Value::Array(run_list));
            return labelled(object, Value::Object(subset));
        }

        if self.id_only {
            return Value::String(name_or_id(object));
        }

        Value::Object(object.to_map())
    }
}

/// The record's name accessor, or its `id` key for objects without one.
pub fn name_or_id(object: &ChefObject) -> String {
    if let Some(name) = object.name() {
        return name;
    }
    match object.to_map().get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn labelled(object: &ChefObject, subset: Value) -> Value {
    let mut outer = Map::new();
    outer.insert(name_or_id(object), subset);
    Value::Object(outer)
}

/// First segment through the accessor (falling back to the map view),
/// remaining segments through nested objects and arrays.
fn extract_nested(object: &ChefObject, path: &[String]) -> Value {
    let Some((first, rest)) = path.split_first() else {
        return Value::Null;
    };

    let head = match object.field(first) {
        Some(value) => value,
        None => match object.to_map().get(first.as_str()) {
            Some(value) => value.clone(),
            None => return Value::Null,
        },
    };

    dig_value(&head, rest).cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filter_string() {
        let spec = ProjectionSpec::from_filter_string("a=x.y, b=z").unwrap();
        let entries: Vec<_> = spec.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("a", path(&["x", "y"]).as_slice()));
        assert_eq!(entries[1], ("b", path(&["z"]).as_slice()));
    }

    #[test]
    fn test_filter_string_strips_all_whitespace() {
        let spec = ProjectionSpec::from_filter_string(" Server Name = name ,\tKernel=kernel.version ").unwrap();
        assert_eq!(spec.get("ServerName"), Some(path(&["name"]).as_slice()));
        assert_eq!(spec.get("Kernel"), Some(path(&["kernel", "version"]).as_slice()));
    }

    #[test]
    fn test_filter_string_splits_on_first_equals() {
        let spec = ProjectionSpec::from_filter_string("a=b=c").unwrap();
        assert_eq!(spec.get("a"), Some(path(&["b=c"]).as_slice()));
    }

    #[test]
    fn test_filter_string_skips_empty_clauses() {
        let spec = ProjectionSpec::from_filter_string("a=x,,b=y,").unwrap();
        assert_eq!(spec.len(), 2);
    }

    #[test]
    fn test_filter_string_missing_equals() {
        let err = ProjectionSpec::from_filter_string("a=x, kernel.version").unwrap_err();
        match err {
            Error::Format { clause, .. } => assert_eq!(clause, "kernel.version"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_filter_string_empty_name_or_path() {
        assert!(matches!(ProjectionSpec::from_filter_string("=x"), Err(Error::Format { .. })));
        assert!(matches!(ProjectionSpec::from_filter_string("a="), Err(Error::Format { .. })));
        assert!(matches!(ProjectionSpec::from_filter_string("a=x..y"), Err(Error::Format { .. })));
    }

    #[test]
    fn test_from_attributes_adds_display_name() {
        let spec = ProjectionSpec::from_attributes(&["x.y", "z"]);
        let names: Vec<&str> = spec.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["x.y", "z", DISPLAY_NAME_KEY]);
        assert_eq!(spec.get("x.y"), Some(path(&["x", "y"]).as_slice()));
        assert_eq!(spec.get(DISPLAY_NAME_KEY), Some(path(&["name"]).as_slice()));
    }

    #[test]
    fn test_from_options_priority() {
        let spec = ProjectionSpec::from_options(Some("a=b"), &["c"]).unwrap().unwrap();
        assert!(spec.get("c").is_none());

        let spec = ProjectionSpec::from_options(None, &["c"]).unwrap().unwrap();
        assert!(spec.get(DISPLAY_NAME_KEY).is_some());

        let empty: [&str; 0] = [];
        assert!(ProjectionSpec::from_options(None, &empty).unwrap().is_none());
    }

    #[test]
    fn test_serializes_in_input_order() {
        let spec = ProjectionSpec::from_filter_string("zeta=a.b, alpha=c").unwrap();
        assert_eq!(
            serde_json::to_string(&spec).unwrap(),
            r#"{"zeta":["a","b"],"alpha":["c"]}"#
        );
    }

    #[test]
    fn test_extract_missing_is_null() {
        let spec = ProjectionSpec::from_filter_string("v=kernel.version, m=missing.path").unwrap();
        let source = json!({"kernel": {"version": "6.1"}});
        let out = spec.extract(source.as_object().unwrap());
        assert_eq!(Value::Object(out), json!({"v": "6.1", "m": null}));
    }

    fn node() -> ChefObject {
        ChefObject::from_json(json!({
            "name": "web01",
            "chef_type": "node",
            "chef_environment": "prod",
            "run_list": ["recipe[nginx]"],
            "automatic": {"kernel": {"version": "6.1"}, "ips": ["10.0.0.1", "10.0.0.2"]}
        }))
        .unwrap()
    }

    #[test]
    fn test_display_projection_with_spec() {
        let projection = DisplayProjection {
            spec: Some(ProjectionSpec::from_attributes(&["kernel.version", "chef_environment", "ips.1"])),
            ..Default::default()
        };
        assert_eq!(
            projection.project(&node()),
            json!({"web01": {"kernel.version": "6.1", "chef_environment": "prod", "ips.1": "10.0.0.2"}})
        );
    }

    #[test]
    fn test_display_projection_run_list_and_id() {
        let run_list = DisplayProjection { run_list: true, ..Default::default() };
        assert_eq!(run_list.project(&node()), json!({"web01": {"run_list": ["recipe[nginx]"]}}));

        let id_only = DisplayProjection { id_only: true, ..Default::default() };
        assert_eq!(id_only.project(&node()), json!("web01"));
    }

    #[test]
    fn test_display_projection_whole_object() {
        let value = DisplayProjection::default().project(&node());
        assert_eq!(value["name"], json!("web01"));
        assert_eq!(value["kernel"]["version"], json!("6.1"));
    }

    #[test]
    fn test_name_or_id_falls_back_to_id() {
        let item = ChefObject::from_json(json!({"id": "alice", "shell": "/bin/sh"})).unwrap();
        assert_eq!(name_or_id(&item), "alice");
    }
}
