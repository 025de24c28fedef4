//! Result records returned by the search index.
//!
//! A search yields either flat maps (partial search with a projection) or
//! whole Chef objects. Objects expose a small set of named accessors plus a
//! flattened map view, and the two do not always agree: a node's `default`
//! accessor returns only default-level attributes while its map view merges
//! every precedence level into the top level.

use serde_json::{Map, Value};

use crate::{Error, Result};

/// One record from the result stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultRecord {
    /// Insertion-ordered key/value map.
    Map(Map<String, Value>),
    /// Inflated Chef object.
    Structured(ChefObject),
}

/// Kind of an inflated Chef object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Node,
    Role,
    Environment,
    Client,
    DataBagItem,
    /// Any other object; only `name` is exposed as an accessor.
    Other(String),
}

impl ObjectKind {
    /// Detect the kind from `chef_type`, falling back to `json_class`.
    fn detect(doc: &Map<String, Value>) -> Self {
        let chef_type = doc.get("chef_type").and_then(Value::as_str);
        let json_class = doc.get("json_class").and_then(Value::as_str);

        match (chef_type, json_class) {
            (Some("node"), _) | (_, Some("Chef::Node")) => ObjectKind::Node,
            (Some("role"), _) | (_, Some("Chef::Role")) => ObjectKind::Role,
            (Some("environment"), _) | (_, Some("Chef::Environment")) => ObjectKind::Environment,
            (Some("client"), _) | (_, Some("Chef::ApiClient")) => ObjectKind::Client,
            (Some("data_bag_item"), _) | (_, Some("Chef::DataBagItem")) => ObjectKind::DataBagItem,
            (Some(other), _) => ObjectKind::Other(other.to_string()),
            (None, Some(other)) => ObjectKind::Other(other.to_string()),
            (None, None) => ObjectKind::Other(String::new()),
        }
    }

    /// Named accessors an object of this kind answers to.
    fn accessors(&self) -> &'static [&'static str] {
        match self {
            ObjectKind::Node => &[
                "name",
                "chef_environment",
                "run_list",
                "policy_name",
                "policy_group",
                "tags",
                "default",
                "normal",
                "override",
                "automatic",
            ],
            ObjectKind::Role => &[
                "name",
                "description",
                "run_list",
                "default_attributes",
                "override_attributes",
                "env_run_lists",
            ],
            ObjectKind::Environment => &[
                "name",
                "description",
                "cookbook_versions",
                "default_attributes",
                "override_attributes",
            ],
            ObjectKind::Client => &["name", "admin", "validator", "public_key"],
            ObjectKind::DataBagItem => &["name", "data_bag", "raw_data"],
            ObjectKind::Other(_) => &["name"],
        }
    }

    /// Value written to `chef_type` in the map view.
    fn chef_type(&self) -> &str {
        match self {
            ObjectKind::Node => "node",
            ObjectKind::Role => "role",
            ObjectKind::Environment => "environment",
            ObjectKind::Client => "client",
            ObjectKind::DataBagItem => "data_bag_item",
            ObjectKind::Other(name) => name,
        }
    }
}

/// Node attribute precedence levels, lowest first.
const NODE_PRECEDENCE: [&str; 4] = ["default", "normal", "override", "automatic"];

/// An inflated Chef object backed by its JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct ChefObject {
    kind: ObjectKind,
    doc: Map<String, Value>,
}

impl ChefObject {
    /// Inflate an object from a search row.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(doc) => Ok(Self {
                kind: ObjectKind::detect(&doc),
                doc,
            }),
            other => Err(Error::InvalidRecord(format!(
                "expected an object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// Read a named accessor.
    ///
    /// Returns `None` when the object has no such accessor; an accessor that
    /// exists but has no stored value yields `Some(Value::Null)`.
    pub fn field(&self, name: &str) -> Option<Value> {
        if !self.kind.accessors().contains(&name) {
            return None;
        }

        let value = match (&self.kind, name) {
            (ObjectKind::Node, "tags") => self
                .doc
                .get("normal")
                .and_then(|normal| normal.get("tags"))
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new())),
            (ObjectKind::Node | ObjectKind::Role, "run_list") => {
                Value::Array(self.run_list().into_iter().map(Value::String).collect())
            }
            (ObjectKind::DataBagItem, "name") => Value::String(self.data_bag_item_name()),
            (ObjectKind::DataBagItem, "raw_data") => self
                .doc
                .get("raw_data")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
            _ => self.doc.get(name).cloned().unwrap_or(Value::Null),
        };

        Some(value)
    }

    /// The object's name accessor, if it has a string one.
    pub fn name(&self) -> Option<String> {
        match self.field("name") {
            Some(Value::String(name)) => Some(name),
            _ => None,
        }
    }

    /// Run list entries (`recipe[x]`, `role[y]`); empty for objects without one.
    pub fn run_list(&self) -> Vec<String> {
        self.doc
            .get("run_list")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Flattened map view of the object.
    pub fn to_map(&self) -> Map<String, Value> {
        match &self.kind {
            ObjectKind::Node => self.node_map(),
            ObjectKind::DataBagItem => {
                let mut map = match self.doc.get("raw_data") {
                    Some(Value::Object(raw)) => raw.clone(),
                    _ => Map::new(),
                };
                map.insert("chef_type".to_string(), Value::String("data_bag_item".to_string()));
                if let Some(bag) = self.doc.get("data_bag") {
                    map.insert("data_bag".to_string(), bag.clone());
                }
                map
            }
            kind => {
                let mut map = self.doc.clone();
                map.shift_remove("json_class");
                if !kind.chef_type().is_empty() {
                    map.insert("chef_type".to_string(), Value::String(kind.chef_type().to_string()));
                }
                map
            }
        }
    }

    fn node_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for level in NODE_PRECEDENCE {
            if let Some(Value::Object(attrs)) = self.doc.get(level) {
                deep_merge(&mut map, attrs);
            }
        }

        let run_list = self.run_list();
        let recipes = run_list_entries(&run_list, "recipe");
        let roles = run_list_entries(&run_list, "role");

        map.insert("chef_type".to_string(), Value::String("node".to_string()));
        for key in ["name", "chef_environment"] {
            map.insert(key.to_string(), self.doc.get(key).cloned().unwrap_or(Value::Null));
        }
        map.insert("recipe".to_string(), recipes);
        map.insert("role".to_string(), roles);
        map.insert(
            "run_list".to_string(),
            Value::Array(run_list.into_iter().map(Value::String).collect()),
        );
        for key in ["policy_name", "policy_group"] {
            if let Some(value) = self.doc.get(key).filter(|v| !v.is_null()) {
                map.insert(key.to_string(), value.clone());
            }
        }
        map
    }

    fn data_bag_item_name(&self) -> String {
        let bag = self.doc.get("data_bag").and_then(Value::as_str).unwrap_or_default();
        let id = self
            .doc
            .get("raw_data")
            .and_then(|raw| raw.get("id"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        format!("data_bag_item_{}_{}", bag, id)
    }
}

/// Names inside `kind[...]` run list entries, in run list order.
fn run_list_entries(run_list: &[String], kind: &str) -> Value {
    let prefix = format!("{}[", kind);
    Value::Array(
        run_list
            .iter()
            .filter_map(|item| item.strip_prefix(&prefix)?.strip_suffix(']'))
            .map(|name| Value::String(name.to_string()))
            .collect(),
    )
}

/// Merge `overlay` into `base`; nested objects merge, everything else replaces.
fn deep_merge(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        if let (Some(Value::Object(existing)), Value::Object(incoming)) = (base.get_mut(key), value) {
            deep_merge(existing, incoming);
            continue;
        }
        base.insert(key.clone(), value.clone());
    }
}

/// Walk `path` from a map through nested objects (by key) and arrays (by index).
pub fn dig<'a>(map: &'a Map<String, Value>, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    dig_value(map.get(first.as_str())?, rest)
}

/// Walk `path` from any value; an empty path yields the value itself.
pub fn dig_value<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment.as_str()),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    })
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
