//! SIFT: Search, Index Fetch and Transform
//!
//! Client-side core of a Chef-style search: query fuzzification, result
//! projection, heterogeneous sort-key resolution and output ordering.

pub mod collector;
pub mod config;
pub mod error;
pub mod projection;
pub mod query;
pub mod record;
pub mod search;
pub mod sequencer;
pub mod sort_key;
pub mod transport;

pub use collector::{CollectedResults, ResultCollector, SortEntry};
pub use config::Config;
pub use error::{Error, Result};
pub use projection::{DisplayProjection, ProjectionSpec, DISPLAY_NAME_KEY};
pub use query::{encode_query, fuzzify, resolve_query_args, SearchQuery, DEFAULT_OBJECT_TYPE};
pub use record::{ChefObject, ObjectKind, ResultRecord};
pub use search::{run_search, SearchOptions, SearchResults};
pub use sequencer::sequence;
pub use sort_key::{resolve_sort_value, SortKey};
pub use transport::{FileTransport, HttpTransport, PageRequest, SearchArgs, SearchPage, SearchTransport};
