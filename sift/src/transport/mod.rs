//! Search transport: page fetching and record inflation.
//!
//! A transport fetches one page of rows at a time; [`search`] drives paging
//! and turns rows into [`ResultRecord`]s.
//!
//! - **Projected search** (`filter_result` set): each row is
//!   `{"url": ..., "data": {...}}` and `data` becomes a map record.
//! - **Full search**: each row is a whole object and becomes a structured record.

mod file;
mod http;

pub use file::FileTransport;
pub use http::HttpTransport;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::projection::ProjectionSpec;
use crate::record::{json_type_name, ChefObject, ResultRecord};
use crate::{Error, Result};

/// Caller-controlled search arguments.
#[derive(Debug, Clone, Default)]
pub struct SearchArgs {
    /// Server-side sort expression.
    pub sort: Option<String>,
    /// First row to return.
    pub start: usize,
    /// Number of rows to return; `None` pages through everything.
    pub rows: Option<usize>,
    /// Partial-search projection.
    pub filter_result: Option<ProjectionSpec>,
}

/// One page request handed to a transport.
#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub object_type: &'a str,
    /// Already percent-encoded query.
    pub encoded_query: &'a str,
    pub sort: Option<&'a str>,
    pub start: usize,
    pub rows: usize,
    pub filter_result: Option<&'a ProjectionSpec>,
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub rows: Vec<Value>,
    #[serde(default)]
    pub start: usize,
    pub total: usize,
}

/// Fetches pages from a search index.
pub trait SearchTransport {
    fn fetch_page(&self, request: &PageRequest<'_>) -> Result<SearchPage>;
}

/// Run a search, handing every record to `on_record` in arrival order.
///
/// A failed page aborts the search; rows that cannot be inflated are skipped.
/// Returns the total reported by the server.
pub fn search<T, F>(
    transport: &T,
    object_type: &str,
    encoded_query: &str,
    args: &SearchArgs,
    page_size: usize,
    mut on_record: F,
) -> Result<usize>
where
    T: SearchTransport + ?Sized,
    F: FnMut(ResultRecord),
{
    let mut start = args.start;
    let rows = args.rows.unwrap_or(page_size).max(1);

    loop {
        let request = PageRequest {
            object_type,
            encoded_query,
            sort: args.sort.as_deref(),
            start,
            rows,
            filter_result: args.filter_result.as_ref(),
        };
        debug!(object_type, start, rows, "fetching search page");

        let page = transport.fetch_page(&request)?;
        let fetched = page.rows.len();
        debug!(fetched, total = page.total, "received search page");

        for row in page.rows {
            if row.is_null() {
                continue;
            }
            match inflate(row, args.filter_result.is_some()) {
                Ok(record) => on_record(record),
                Err(e) => warn!("skipping search row: {}", e),
            }
        }

        // An explicit row count asks for exactly one page
        if args.rows.is_some() || fetched == 0 || start + fetched >= page.total {
            info!(total = page.total, "search complete");
            return Ok(page.total);
        }
        start += fetched;
    }
}

/// Turn a raw row into a record.
fn inflate(row: Value, projected: bool) -> Result<ResultRecord> {
    if !projected {
        return ChefObject::from_json(row).map(ResultRecord::Structured);
    }

    match row {
        Value::Object(mut wrapper) => match wrapper.shift_remove("data") {
            Some(Value::Object(data)) => Ok(ResultRecord::Map(data)),
            Some(other) => Err(Error::InvalidRecord(format!(
                "partial search data must be an object, got {}",
                json_type_name(&other)
            ))),
            None => Err(Error::InvalidRecord("partial search row has no data".to_string())),
        },
        other => Err(Error::InvalidRecord(format!(
            "expected an object, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Parse a search response body into a page.
pub(crate) fn parse_page(body: &str) -> Result<SearchPage> {
    Ok(serde_json::from_str(body)?)
}

/// Pull the message out of an error body like `{"error": ["message"]}`.
pub(crate) fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|value| match value.get("error") {
        Some(Value::Array(messages)) => messages.first().and_then(Value::as_str).map(str::to_string),
        Some(Value::String(message)) => Some(message.clone()),
        _ => None,
    });
    message.unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    /// Serves canned pages and records every request.
    struct ScriptedTransport {
        pages: RefCell<Vec<Result<SearchPage>>>,
        starts: RefCell<Vec<(usize, usize)>>,
    }

    impl ScriptedTransport {
        fn new(pages: Vec<Result<SearchPage>>) -> Self {
            Self {
                pages: RefCell::new(pages.into_iter().rev().collect()),
                starts: RefCell::new(Vec::new()),
            }
        }
    }

    impl SearchTransport for ScriptedTransport {
        fn fetch_page(&self, request: &PageRequest<'_>) -> Result<SearchPage> {
            self.starts.borrow_mut().push((request.start, request.rows));
            self.pages
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| Ok(SearchPage::default()))
        }
    }

    fn node(name: &str) -> Value {
        json!({"chef_type": "node", "name": name})
    }

    #[test]
    fn test_pages_until_total() {
        let transport = ScriptedTransport::new(vec![
            Ok(SearchPage { rows: vec![node("a"), node("b")], start: 0, total: 3 }),
            Ok(SearchPage { rows: vec![node("c")], start: 2, total: 3 }),
        ]);

        let mut names = Vec::new();
        let total = search(&transport, "node", "*:*", &SearchArgs::default(), 2, |record| {
            if let ResultRecord::Structured(object) = record {
                names.push(object.name().unwrap());
            }
        })
        .unwrap();

        assert_eq!(total, 3);
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(*transport.starts.borrow(), vec![(0, 2), (2, 2)]);
    }

    #[test]
    fn test_explicit_rows_fetches_one_page() {
        let transport = ScriptedTransport::new(vec![Ok(SearchPage {
            rows: vec![node("a")],
            start: 5,
            total: 10,
        })]);
        let args = SearchArgs { start: 5, rows: Some(1), ..Default::default() };

        let mut count = 0;
        search(&transport, "node", "*:*", &args, 1000, |_| count += 1).unwrap();

        assert_eq!(count, 1);
        assert_eq!(*transport.starts.borrow(), vec![(5, 1)]);
    }

    #[test]
    fn test_empty_page_stops() {
        let transport = ScriptedTransport::new(vec![Ok(SearchPage { rows: vec![], start: 0, total: 50 })]);
        let mut count = 0;
        search(&transport, "node", "*:*", &SearchArgs::default(), 10, |_| count += 1).unwrap();
        assert_eq!(count, 0);
        assert_eq!(transport.starts.borrow().len(), 1);
    }

    #[test]
    fn test_projected_rows_become_maps_and_bad_rows_are_skipped() {
        let transport = ScriptedTransport::new(vec![Ok(SearchPage {
            rows: vec![
                json!({"url": "/nodes/a", "data": {"__display_name": "a"}}),
                json!(null),
                json!({"url": "/nodes/b"}),
                json!("garbage"),
                json!({"url": "/nodes/c", "data": {"__display_name": "c"}}),
            ],
            start: 0,
            total: 5,
        })]);
        let args = SearchArgs {
            filter_result: Some(ProjectionSpec::from_attributes(&["fqdn"])),
            ..Default::default()
        };

        let mut records = Vec::new();
        search(&transport, "node", "*:*", &args, 10, |record| records.push(record)).unwrap();

        assert_eq!(records.len(), 2);
        assert!(matches!(&records[0], ResultRecord::Map(map) if map["__display_name"] == json!("a")));
    }

    #[test]
    fn test_page_error_aborts() {
        let transport = ScriptedTransport::new(vec![
            Ok(SearchPage { rows: vec![node("a")], start: 0, total: 2 }),
            Err(Error::transport("boom")),
        ]);
        let result = search(&transport, "node", "*:*", &SearchArgs::default(), 1, |_| {});
        assert!(matches!(result, Err(Error::Transport { .. })));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"error": ["invalid search query"]}"#), "invalid search query");
        assert_eq!(error_message(r#"{"error": "nope"}"#), "nope");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_parse_page_defaults() {
        let page = parse_page(r#"{"rows": [{"name": "a"}], "total": 1}"#).unwrap();
        assert_eq!(page.start, 0);
        assert_eq!(page.rows.len(), 1);
    }

    #[test]
    fn test_parse_page_requires_total() {
        let result = parse_page(r#"{"rows": [{"name": "a"}], "start": 0}"#);
        assert!(matches!(result, Err(Error::Json(_))));
    }

    /// Answers from a fixed row set with bodies that omit `start`.
    struct BodyTransport {
        rows: Vec<Value>,
        calls: RefCell<Vec<usize>>,
    }

    impl SearchTransport for BodyTransport {
        fn fetch_page(&self, request: &PageRequest<'_>) -> Result<SearchPage> {
            self.calls.borrow_mut().push(request.start);
            let start = request.start.min(self.rows.len());
            let end = (start + request.rows).min(self.rows.len());
            let body = json!({"rows": &self.rows[start..end], "total": self.rows.len()});
            parse_page(&body.to_string())
        }
    }

    #[test]
    fn test_paging_follows_requested_offset_when_start_is_missing() {
        let transport = BodyTransport {
            rows: vec![node("a"), node("b"), node("c"), node("d")],
            calls: RefCell::new(Vec::new()),
        };

        let mut names = Vec::new();
        let total = search(&transport, "node", "*:*", &SearchArgs::default(), 2, |record| {
            if let ResultRecord::Structured(object) = record {
                names.push(object.name().unwrap());
            }
        })
        .unwrap();

        assert_eq!(total, 4);
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert_eq!(*transport.calls.borrow(), vec![0, 2]);
    }
}
