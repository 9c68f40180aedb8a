//! Multi-source search aggregation.
//!
//! A search runs through these steps:
//!
//! 1. **Cache check**: a cached result list for the normalized query is
//!    returned as is; no source is contacted and history is not touched.
//! 2. **Fan-out**: every primary source is queried concurrently, each under
//!    its own timeout. A failing or slow source contributes nothing.
//! 3. **Fallback**: when the primary sources together returned fewer records
//!    than the threshold, the fallback source is queried once.
//! 4. **Merge**: results are concatenated in registration order, fallback
//!    last, and deduplicated by URL keeping the first occurrence.
//! 5. **Persist**: non-empty results are cached and the query is recorded in
//!    history.
//!
//! Only the most recent search may persist. A search that was overtaken by a
//! newer one while in flight reports [`SearchOutcome::Superseded`].

use futures_util::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::models::{DocumentRecord, SearchOutcome};
use crate::sources::{absorb, search_within, Source, SourceError, SourceRegistry};
use crate::utils::{
    deduplicate_by_url, find_duplicates, CacheResult, CacheService, HistoryService, Store,
};

/// Default number of primary results below which the fallback runs
pub const DEFAULT_FALLBACK_THRESHOLD: usize = 3;

/// Default per-source timeout
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that end a search without an outcome
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The query was empty after trimming
    #[error("Query is empty")]
    EmptyQuery,

    /// Every contacted source failed to connect or timed out
    #[error("Search failed. Check your network.")]
    Network(String),
}

impl SearchError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            SearchError::EmptyQuery => "Enter a topic to search for.",
            SearchError::Network(_) => "Search failed. Check your network.",
        }
    }
}

/// Tunables of the aggregation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// The fallback runs when the primary sources return fewer records
    pub fallback_threshold: usize,

    /// Upper bound on each source call
    pub source_timeout: Duration,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            fallback_threshold: DEFAULT_FALLBACK_THRESHOLD,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }
}

impl AggregatorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fallback_threshold: config.fallback.threshold,
            source_timeout: config.sources.timeout(),
        }
    }
}

/// What one source call produced
#[derive(Debug)]
struct SourceReport {
    id: String,
    documents: Vec<DocumentRecord>,
    error: Option<SourceError>,
}

impl SourceReport {
    /// Whether the source was reached or at least attempted over the network
    ///
    /// A source that refused to run (e.g. a missing API key) was never
    /// contacted and says nothing about connectivity.
    fn contacted(&self) -> bool {
        !matches!(self.error, Some(SourceError::InvalidRequest(_)))
    }

    fn transport_failed(&self) -> bool {
        self.error.as_ref().is_some_and(SourceError::is_transport)
    }
}

/// Search aggregator over a registry of sources
#[derive(Debug)]
pub struct Aggregator {
    registry: SourceRegistry,
    cache: CacheService,
    history: HistoryService,
    settings: AggregatorSettings,
    sequence: AtomicU64,
}

impl Aggregator {
    /// Create an aggregator with default settings
    pub fn new(registry: SourceRegistry, cache: CacheService, history: HistoryService) -> Self {
        Self {
            registry,
            cache,
            history,
            settings: AggregatorSettings::default(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn with_settings(mut self, settings: AggregatorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the configured sources, cache and history over `store`
    pub fn from_config(config: &Config, store: Arc<dyn Store>) -> Result<Self, SourceError> {
        let registry = SourceRegistry::from_config(config)?;
        let cache = if config.cache.enabled {
            CacheService::new(Arc::clone(&store))
        } else {
            CacheService::disabled(Arc::clone(&store))
        };
        let history = HistoryService::with_limit(store, config.history.max_entries);
        tracing::debug!("Configured sources: {}", registry.ids().join(", "));

        Ok(Self::new(registry, cache, history).with_settings(AggregatorSettings::from_config(config)))
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    pub fn history(&self) -> &HistoryService {
        &self.history
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Run one search
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let ticket = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;

        if let CacheResult::Hit(documents) = self.cache.get_search(query) {
            return Ok(SearchOutcome::Found {
                query: query.to_string(),
                documents,
                from_cache: true,
            });
        }

        let mut reports = self.fetch_primary(query).await;

        let primary_count: usize = reports.iter().map(|r| r.documents.len()).sum();
        if primary_count < self.settings.fallback_threshold {
            if let Some(fallback) = self.registry.fallback() {
                tracing::info!(
                    "Primary sources returned {} results (< {}), using fallback {}",
                    primary_count,
                    self.settings.fallback_threshold,
                    fallback.id()
                );
                reports.push(self.run_source(Arc::clone(fallback), query).await);
            }
        }

        if self.sequence.load(Ordering::SeqCst) != ticket {
            tracing::debug!("Dropping superseded results for '{}'", query);
            return Ok(SearchOutcome::Superseded {
                query: query.to_string(),
            });
        }

        let merged: Vec<DocumentRecord> = reports
            .iter_mut()
            .flat_map(|r| std::mem::take(&mut r.documents))
            .collect();

        if merged.is_empty() {
            let contacted: Vec<&SourceReport> = reports.iter().filter(|r| r.contacted()).collect();
            if !contacted.is_empty() && contacted.iter().all(|r| r.transport_failed()) {
                let detail = contacted
                    .iter()
                    .filter_map(|r| r.error.as_ref().map(|e| format!("{}: {}", r.id, e)))
                    .collect::<Vec<_>>()
                    .join("; ");
                tracing::warn!("All sources failed for '{}': {}", query, detail);
                return Err(SearchError::Network(detail));
            }
        }

        if tracing::enabled!(tracing::Level::DEBUG) {
            for group in find_duplicates(&merged) {
                tracing::debug!("Duplicate URL {} at positions {:?}", merged[group[0]].url, group);
            }
        }
        let documents = deduplicate_by_url(merged);

        self.persist(query, &documents);

        if documents.is_empty() {
            Ok(SearchOutcome::no_results(query))
        } else {
            Ok(SearchOutcome::Found {
                query: query.to_string(),
                documents,
                from_cache: false,
            })
        }
    }

    /// Query every primary source concurrently
    async fn fetch_primary(&self, query: &str) -> Vec<SourceReport> {
        let futures = self
            .registry
            .primary()
            .iter()
            .map(|source| self.run_source(Arc::clone(source), query));

        join_all(futures).await
    }

    /// Run one source under the timeout, never failing
    ///
    /// Same error handling as [`Source::fetch`], with the per-source deadline
    /// added and the error kept for failure classification.
    async fn run_source(&self, source: Arc<dyn Source>, query: &str) -> SourceReport {
        let id = source.id().to_string();
        let result = search_within(source.as_ref(), query, self.settings.source_timeout).await;
        let (documents, error) = absorb(&id, result);

        tracing::debug!("{} returned {} results", id, documents.len());
        SourceReport {
            id,
            documents,
            error,
        }
    }

    /// Cache non-empty results and record the query; failures are only logged
    fn persist(&self, query: &str, documents: &[DocumentRecord]) {
        if !documents.is_empty() {
            if let Err(e) = self.cache.set_search(query, documents) {
                tracing::warn!("Failed to cache results for '{}': {}", query, e);
            }
        }

        if let Err(e) = self.history.add_search(query) {
            tracing::warn!("Failed to record '{}' in history: {}", query, e);
        }
    }
}
