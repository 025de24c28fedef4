//! Query construction for the search index.
//!
//! # Overview
//!
//! - **Fuzzification**: a bare term (no `field:` selector) is widened into a
//!   wildcard disjunction over the common identity fields.
//! - **Encoding**: the final query is percent-encoded as a URI query component.
//! - **Arguments**: positional `[TYPE] QUERY` and `--query` are reconciled into
//!   a single `SearchQuery`.

mod builder;

pub use builder::{
    encode_query, fuzzify, resolve_query_args, SearchQuery, DEFAULT_OBJECT_TYPE, FUZZY_FIELDS,
};
