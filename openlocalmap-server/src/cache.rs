//! Caching layer for Overpass responses.
//!
//! Area searches are frequently repeated (reloading the map, toggling a
//! route back on), and Overpass is a shared public service. Successful
//! responses are cached by exact query text; failures are never cached so a
//! retry always reaches the server.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::overpass::{CancelToken, OverpassElement, OverpassError, OverpassQuery, QueryExecutor};

/// Cached response entry.
type Entry = Arc<Vec<OverpassElement>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_capacity: 500,
        }
    }
}

/// Query executor with caching.
///
/// Wraps any [`QueryExecutor`] and serves repeated queries from memory.
pub struct CachedExecutor<E> {
    inner: E,
    cache: MokaCache<String, Entry>,
}

impl<E: QueryExecutor> CachedExecutor<E> {
    /// Create a new cached executor.
    pub fn new(inner: E, config: &CacheConfig) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, cache }
    }

    /// Access the underlying executor for queries that bypass the cache.
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Get cache statistics.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl<E: QueryExecutor> QueryExecutor for CachedExecutor<E> {
    async fn execute(
        &self,
        query: &OverpassQuery,
        cancel: &CancelToken,
    ) -> Result<Vec<OverpassElement>, OverpassError> {
        if cancel.is_cancelled() {
            return Err(OverpassError::Cancelled);
        }
        if let Some(cached) = self.cache.get(query.text()).await {
            debug!(elements = cached.len(), "Overpass cache hit");
            return Ok(cached.as_ref().clone());
        }

        let elements = self.inner.execute(query, cancel).await?;
        self.cache
            .insert(query.text().to_string(), Arc::new(elements.clone()))
            .await;

        Ok(elements)
    }
}
