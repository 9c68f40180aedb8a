//! Registry for the configured document sources.

use std::sync::Arc;
use std::time::Duration;

use super::{ArxivSource, DoajSource, GeminiSource, OpenLibrarySource, PdfLinkPolicy, Source, SourceError};
use crate::config::Config;
use crate::utils::HttpClient;

/// Ordered set of primary sources plus an optional fallback
///
/// Registration order is merge order: results of earlier sources win
/// duplicate URLs.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
    fallback: Option<Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create a registry with the default sources: arXiv, DOAJ, OpenLibrary,
    /// and Gemini as fallback
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&Config::default())
    }

    /// Create a registry without any source
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the sources described by a configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let timeout = Duration::from_secs(config.sources.timeout_seconds.max(1));
        let client = Arc::new(HttpClient::with_timeout(timeout)?);
        let max = config.sources.max_results;

        let policy = PdfLinkPolicy::from_pattern(&config.sources.doaj_pdf_pattern)?;

        let mut registry = Self::empty();
        registry.register(Arc::new(
            ArxivSource::with_client(Arc::clone(&client))
                .base_url(&config.sources.arxiv_url)
                .max_results(max),
        ));
        registry.register(Arc::new(
            DoajSource::with_client(Arc::clone(&client))
                .base_url(&config.sources.doaj_url)
                .max_results(max)
                .pdf_policy(policy),
        ));
        registry.register(Arc::new(
            OpenLibrarySource::with_client(Arc::clone(&client))
                .base_url(&config.sources.openlibrary_url)
                .max_results(max),
        ));

        if config.fallback.enabled {
            let gemini = GeminiSource::with_client(client)
                .api_key(config.fallback.resolved_api_key())
                .model(&config.fallback.model)
                .base_url(&config.fallback.api_url);
            if !gemini.has_api_key() {
                tracing::debug!("No Gemini API key configured; fallback calls will fail");
            }
            registry.set_fallback(Arc::new(gemini));
        }

        Ok(registry)
    }

    /// Append a primary source
    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.push(source);
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_source(mut self, source: Arc<dyn Source>) -> Self {
        self.register(source);
        self
    }

    pub fn set_fallback(&mut self, source: Arc<dyn Source>) {
        self.fallback = Some(source);
    }

    /// Builder form of [`set_fallback`](Self::set_fallback)
    pub fn with_fallback(mut self, source: Arc<dyn Source>) -> Self {
        self.set_fallback(source);
        self
    }

    /// Primary sources in merge order
    pub fn primary(&self) -> &[Arc<dyn Source>] {
        &self.sources
    }

    pub fn fallback(&self) -> Option<&Arc<dyn Source>> {
        self.fallback.as_ref()
    }

    /// IDs of all sources, fallback last
    pub fn ids(&self) -> Vec<&str> {
        self.sources
            .iter()
            .chain(self.fallback.iter())
            .map(|s| s.id())
            .collect()
    }

    /// Number of primary sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
