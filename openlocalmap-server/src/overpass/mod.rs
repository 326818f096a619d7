//! Overpass API access.
//!
//! Provides a typed query builder, an HTTP client with per-query timeouts
//! and cooperative cancellation, the JSON element model, and a mock executor.

mod cancel;
mod client;
mod error;
mod mock;
mod query;
mod types;

pub use cancel::CancelToken;
pub use client::{
    DEFAULT_ENDPOINT, HttpTransport, OverpassClient, OverpassConfig, QueryExecutor, RawResponse,
    Transport,
};
pub use error::OverpassError;
pub use mock::MockOverpass;
pub use query::{
    ElementKind, OutMode, OverpassQuery, QueryBuilder, Scope, Selector, TagFilter,
};
pub use types::{Member, MemberType, Node, OverpassElement, OverpassResponse, Relation, Way};
