//! One search run: build inputs, stream, collect, order.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::collector::ResultCollector;
use crate::projection::{DisplayProjection, ProjectionSpec};
use crate::query::SearchQuery;
use crate::sequencer::sequence;
use crate::sort_key::SortKey;
use crate::transport::{search, SearchArgs, SearchTransport};
use crate::Result;

/// User options shaping a search run.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Sort key (also forwarded to the server).
    pub sort: Option<String>,
    /// First row to return.
    pub start: usize,
    /// Number of rows to return.
    pub rows: Option<usize>,
    /// Filter expression `name=path, ...`.
    pub filter_result: Option<String>,
    /// Dotted attributes to return.
    pub attributes: Vec<String>,
    /// Show only run lists.
    pub run_list: bool,
    /// Show only names.
    pub id_only: bool,
}

/// Ordered, projected results of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    /// Number of records received.
    pub results: usize,
    /// Projected records in emission order.
    pub rows: Vec<Value>,
}

/// Run a search end to end.
///
/// A malformed filter fails before the transport is called. A transport
/// failure discards everything collected so far.
pub fn run_search<T>(
    transport: &T,
    query: &SearchQuery,
    options: &SearchOptions,
    page_size: usize,
) -> Result<SearchResults>
where
    T: SearchTransport + ?Sized,
{
    let spec = ProjectionSpec::from_options(options.filter_result.as_deref(), &options.attributes)?;
    let sort_key = options.sort.as_deref().map(SortKey::new);

    let fuzzy = query.fuzzy_text();
    let encoded = query.encoded();
    debug!(object_type = %query.object_type, query = %fuzzy, encoded = %encoded, "prepared search");

    let projection = DisplayProjection {
        spec: spec.clone(),
        run_list: options.run_list,
        id_only: options.id_only,
    };
    let args = SearchArgs {
        sort: options.sort.clone(),
        start: options.start,
        rows: options.rows,
        filter_result: spec,
    };

    let mut collector = ResultCollector::new(&projection, sort_key.as_ref());
    search(transport, &query.object_type, &encoded, &args, page_size, |record| {
        collector.collect(record)
    })?;

    let collected = collector.finish();
    let results = collected.len();
    info!(results, "collected search results");

    Ok(SearchResults {
        results,
        rows: sequence(collected, sort_key.is_some()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{PageRequest, SearchPage};
    use crate::Error;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    struct PagedTransport {
        pages: RefCell<Vec<Result<SearchPage>>>,
        calls: Cell<usize>,
        last_query: RefCell<String>,
        last_filter: RefCell<Option<String>>,
    }

    impl PagedTransport {
        fn new(pages: Vec<Result<SearchPage>>) -> Self {
            Self {
                pages: RefCell::new(pages.into_iter().rev().collect()),
                calls: Cell::new(0),
                last_query: RefCell::new(String::new()),
                last_filter: RefCell::new(None),
            }
        }
    }

    impl SearchTransport for PagedTransport {
        fn fetch_page(&self, request: &PageRequest<'_>) -> Result<SearchPage> {
            self.calls.set(self.calls.get() + 1);
            *self.last_query.borrow_mut() = request.encoded_query.to_string();
            *self.last_filter.borrow_mut() =
                request.filter_result.map(|spec| serde_json::to_string(spec).unwrap());
            self.pages.borrow_mut().pop().unwrap_or_else(|| Ok(SearchPage::default()))
        }
    }

    fn node(name: &str, uptime: u64) -> Value {
        json!({"chef_type": "node", "name": name, "automatic": {"uptime_seconds": uptime}})
    }

    #[test]
    fn test_sorted_run() {
        let transport = PagedTransport::new(vec![Ok(SearchPage {
            rows: vec![node("c", 30), node("a", 10), node("b", 20)],
            start: 0,
            total: 3,
        })]);
        let options = SearchOptions {
            sort: Some("uptime_seconds".to_string()),
            id_only: true,
            ..Default::default()
        };

        let results = run_search(&transport, &SearchQuery::new("node", "web"), &options, 1000).unwrap();
        assert_eq!(results.results, 3);
        assert_eq!(results.rows, vec![json!("a"), json!("b"), json!("c")]);
        assert!(transport.last_query.borrow().starts_with("tags:*web*%20OR%20"));
    }

    #[test]
    fn test_unsorted_run_keeps_arrival_order() {
        let transport = PagedTransport::new(vec![Ok(SearchPage {
            rows: vec![node("c", 30), node("a", 10)],
            start: 0,
            total: 2,
        })]);
        let options = SearchOptions { id_only: true, ..Default::default() };

        let results = run_search(&transport, &SearchQuery::new("node", "name:*"), &options, 1000).unwrap();
        assert_eq!(results.rows, vec![json!("c"), json!("a")]);
        assert_eq!(*transport.last_query.borrow(), "name:*");
    }

    #[test]
    fn test_attributes_sent_as_partial_search() {
        let transport = PagedTransport::new(vec![Ok(SearchPage {
            rows: vec![json!({"url": "/nodes/a", "data": {"fqdn": "a.example", "__display_name": "a"}})],
            start: 0,
            total: 1,
        })]);
        let options = SearchOptions { attributes: vec!["fqdn".to_string()], ..Default::default() };

        let results = run_search(&transport, &SearchQuery::new("node", "name:a"), &options, 1000).unwrap();
        assert_eq!(results.rows, vec![json!({"a": {"fqdn": "a.example"}})]);
        assert_eq!(
            transport.last_filter.borrow().as_deref(),
            Some(r#"{"fqdn":["fqdn"],"__display_name":["name"]}"#)
        );
    }

    #[test]
    fn test_malformed_filter_fails_before_transport() {
        let transport = PagedTransport::new(vec![]);
        let options = SearchOptions { filter_result: Some("broken".to_string()), ..Default::default() };

        let err = run_search(&transport, &SearchQuery::new("node", "web"), &options, 1000).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
        assert_eq!(transport.calls.get(), 0);
    }

    #[test]
    fn test_transport_failure_discards_partial_results() {
        let transport = PagedTransport::new(vec![
            Ok(SearchPage { rows: vec![node("a", 1), node("b", 2)], start: 0, total: 4 }),
            Err(Error::Transport { status: Some(500), message: "index unavailable".to_string() }),
        ]);

        let result = run_search(&transport, &SearchQuery::new("node", "web"), &SearchOptions::default(), 2);
        match result {
            Err(Error::Transport { message, .. }) => assert_eq!(message, "index unavailable"),
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
