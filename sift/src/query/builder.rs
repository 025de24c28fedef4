//! Query builder: fuzzification, encoding and argument resolution.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::{Error, Result};

/// Object type searched when only a query is given.
pub const DEFAULT_OBJECT_TYPE: &str = "node";

/// Fields a bare term is matched against, in emission order.
pub const FUZZY_FIELDS: [&str; 6] = [
    "tags",
    "roles",
    "fqdn",
    "addresses",
    "policy_name",
    "policy_group",
];

/// Characters left untouched in a URI query component:
/// unreserved, sub-delims, `:`, `@`, `/` and `?`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@')
    .remove(b'/')
    .remove(b'?');

/// A search request against one object index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Index to search: node, role, environment, client, or a data bag name.
    pub object_type: String,
    /// Query text as typed by the user.
    pub raw_text: String,
}

impl SearchQuery {
    pub fn new(object_type: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            raw_text: raw_text.into(),
        }
    }

    /// Query text after fuzzification.
    pub fn fuzzy_text(&self) -> String {
        fuzzify(&self.raw_text)
    }

    /// Fuzzified, percent-encoded query ready for the transport.
    pub fn encoded(&self) -> String {
        encode_query(&self.fuzzy_text())
    }
}

/// Widen a bare term into a wildcard match over [`FUZZY_FIELDS`].
///
/// Queries containing a `:` already name a field and are returned unchanged.
pub fn fuzzify(query: &str) -> String {
    if query.contains(':') {
        return query.to_string();
    }

    FUZZY_FIELDS
        .iter()
        .map(|field| format!("{}:*{}*", field, query))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Percent-encode a query for use as a URI query component.
pub fn encode_query(query: &str) -> String {
    utf8_percent_encode(query, QUERY_COMPONENT).to_string()
}

/// Reconcile positional arguments with an explicit `--query` option.
///
/// - `--query` given: at most one positional (the object type).
/// - otherwise: `QUERY` alone searches nodes, `TYPE QUERY` searches `TYPE`.
pub fn resolve_query_args(positional: &[String], query_opt: Option<&str>) -> Result<SearchQuery> {
    if let Some(query) = query_opt {
        if positional.len() > 1 {
            return Err(Error::Usage(
                "Please specify query as an argument or an option via -q, not both".to_string(),
            ));
        }
        let object_type = positional
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_OBJECT_TYPE);
        return Ok(SearchQuery::new(object_type, query));
    }

    match positional {
        [] => Err(Error::Usage("No query specified".to_string())),
        [query] => Ok(SearchQuery::new(DEFAULT_OBJECT_TYPE, query.as_str())),
        [object_type, query] => Ok(SearchQuery::new(object_type.as_str(), query.as_str())),
        _ => Err(Error::Usage(format!(
            "Too many arguments: expected [TYPE] QUERY, got {}",
            positional.len()
        ))),
    }
}
