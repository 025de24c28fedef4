//! Replay transport backed by a recorded search response.
//!
//! The file holds either a full response (`{"rows": [...], "total": n}`) or a
//! bare array of rows. Pages are cut from the recorded rows; with a projection
//! each row is reduced the way a partial search would reduce it.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use super::{PageRequest, SearchPage, SearchTransport};
use crate::record::ChefObject;
use crate::{Error, Result};

/// Serves search pages from a JSON file.
#[derive(Debug, Clone)]
pub struct FileTransport {
    path: PathBuf,
    rows: Vec<Value>,
}

impl FileTransport {
    /// Load a recorded response.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&contents)?;
        let rows = match value {
            Value::Array(rows) => rows,
            Value::Object(mut response) => match response.shift_remove("rows") {
                Some(Value::Array(rows)) => rows,
                _ => {
                    return Err(Error::transport(format!(
                        "{}: recorded response has no rows array",
                        path.display()
                    )))
                }
            },
            _ => {
                return Err(Error::transport(format!(
                    "{}: expected a response object or an array of rows",
                    path.display()
                )))
            }
        };

        debug!(path = %path.display(), rows = rows.len(), "loaded recorded search response");
        Ok(Self {
            path: path.to_path_buf(),
            rows,
        })
    }

}

impl SearchTransport for FileTransport {
    fn fetch_page(&self, request: &PageRequest<'_>) -> Result<SearchPage> {
        let total = self.rows.len();
        let start = request.start.min(total);
        let end = start.saturating_add(request.rows).min(total);
        debug!(path = %self.path.display(), start, end, "serving recorded rows");

        let rows = self.rows[start..end]
            .iter()
            .map(|row| match request.filter_result {
                Some(spec) => {
                    let source = match ChefObject::from_json(row.clone()) {
                        Ok(object) => object.to_map(),
                        Err(_) => Map::new(),
                    };
                    let mut wrapped = Map::new();
                    wrapped.insert("url".to_string(), Value::String(row_url(request.object_type, row)));
                    wrapped.insert("data".to_string(), Value::Object(spec.extract(&source)));
                    Value::Object(wrapped)
                }
                None => row.clone(),
            })
            .collect();

        Ok(SearchPage { rows, start, total })
    }
}

fn row_url(object_type: &str, row: &Value) -> String {
    let name = row
        .get("name")
        .or_else(|| row.get("id"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    format!("/{}/{}", collection_for(object_type), name)
}

fn collection_for(object_type: &str) -> String {
    match object_type {
        "node" | "role" | "environment" | "client" => format!("{}s", object_type),
        bag => format!("data/{}", bag),
    }
}
