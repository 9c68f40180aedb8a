//! Local caching of aggregated search results.
//!
//! Results are stored per normalized query (trimmed and lower-cased) under
//! the key `cache:<query>`. Entries never expire: a hit is authoritative until
//! the cache is cleared.

use std::sync::Arc;

use crate::models::{normalize_query, DocumentRecord};
use crate::utils::store::{load_json, save_json, Store, StoreError};

const CACHE_KEY_PREFIX: &str = "cache:";

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult<T> {
    /// Item was found
    Hit(T),

    /// Item was not found
    Miss,
}

/// Cache service for search results
#[derive(Debug, Clone)]
pub struct CacheService {
    store: Arc<dyn Store>,
    enabled: bool,
}

impl CacheService {
    /// Create a cache on top of `store`
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            enabled: true,
        }
    }

    /// Create a cache that never hits and never writes
    pub fn disabled(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            enabled: false,
        }
    }

    /// Store key for a query
    pub fn cache_key(query: &str) -> String {
        format!("{}{}", CACHE_KEY_PREFIX, normalize_query(query))
    }

    /// Read the cached results for a query
    pub fn get_search(&self, query: &str) -> CacheResult<Vec<DocumentRecord>> {
        if !self.enabled {
            return CacheResult::Miss;
        }

        let key = Self::cache_key(query);
        match load_json::<Vec<DocumentRecord>>(self.store.as_ref(), &key) {
            Ok(Some(documents)) => {
                tracing::debug!("Cache HIT for search: {}", key);
                CacheResult::Hit(documents)
            }
            Ok(None) => {
                tracing::debug!("Cache MISS for search: {}", key);
                CacheResult::Miss
            }
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", key, e);
                CacheResult::Miss
            }
        }
    }

    /// Cache the results for a query, replacing any previous entry
    pub fn set_search(&self, query: &str, documents: &[DocumentRecord]) -> Result<(), StoreError> {
        if !self.enabled {
            return Ok(());
        }

        let key = Self::cache_key(query);
        save_json(self.store.as_ref(), &key, &documents)?;
        tracing::debug!("Cached {} documents: {}", documents.len(), key);
        Ok(())
    }

    /// Remove the cached results of one query
    pub fn clear_search(&self, query: &str) -> Result<(), StoreError> {
        self.store.remove(&Self::cache_key(query))
    }

    /// Remove every cached search, leaving history and bookmarks alone
    pub fn clear_all(&self) -> Result<usize, StoreError> {
        let keys = self.cached_queries()?;
        for query in &keys {
            self.store.remove(&format!("{}{}", CACHE_KEY_PREFIX, query))?;
        }
        tracing::info!("Search cache cleared ({} entries)", keys.len());
        Ok(keys.len())
    }

    /// Normalized queries that currently have a cache entry
    pub fn cached_queries(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(CACHE_KEY_PREFIX).map(|q| q.to_string()))
            .collect())
    }

    /// Get cache statistics
    ///
    /// Counts what is on disk, whether or not this service reads from it.
    pub fn stats(&self) -> Result<CacheStats, StoreError> {
        let queries = self.cached_queries()?;
        let mut document_count = 0;
        for query in &queries {
            let key = format!("{}{}", CACHE_KEY_PREFIX, query);
            match load_json::<Vec<DocumentRecord>>(self.store.as_ref(), &key) {
                Ok(Some(docs)) => document_count += docs.len(),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping unreadable cache entry {}: {}", key, e),
            }
        }

        Ok(CacheStats {
            enabled: self.enabled,
            query_count: queries.len(),
            document_count,
        })
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Whether caching is enabled
    pub enabled: bool,

    /// Number of cached queries
    pub query_count: usize,

    /// Number of documents across all cached queries
    pub document_count: usize,
}
