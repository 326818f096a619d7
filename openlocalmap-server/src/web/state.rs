//! Application state for the web layer.

use std::sync::Arc;

use crate::overpass::QueryExecutor;
use crate::routes::RouteSearch;

/// Shared application state.
pub struct AppState<E> {
    /// Route search over the (usually cached) Overpass executor
    pub search: Arc<RouteSearch<E>>,
}

impl<E: QueryExecutor> AppState<E> {
    /// Create a new app state.
    pub fn new(search: RouteSearch<E>) -> Self {
        Self {
            search: Arc::new(search),
        }
    }
}

impl<E> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            search: Arc::clone(&self.search),
        }
    }
}
