//! Document source adapters.
//!
//! Every provider implements the [`Source`] trait and turns a free-text query
//! into a list of [`DocumentRecord`]s. The free academic indexes are the
//! primary sources; the Gemini adapter is the AI fallback, consulted only
//! when the primary sources come back thin.
//!
//! # Error contract
//!
//! [`Source::search`] reports failures as [`SourceError`] so the caller can
//! tell a transport failure from a bad payload. [`Source::fetch`] is the
//! no-raise entry point: any error is logged and becomes an empty list.
//! The aggregator goes through [`search_within`] instead, which adds a
//! deadline, and settles the result with the same [`absorb`] as `fetch`.
//!
//! # Sources
//!
//! - `arxiv` - arXiv Atom API, PDF links only
//! - `doaj` - Directory of Open Access Journals, full-text links that pass the [`PdfLinkPolicy`]
//! - `openlibrary` - OpenLibrary search, work pages
//! - `gemini` - Gemini with Google Search grounding (fallback)

mod arxiv;
mod doaj;
mod gemini;
mod openlibrary;
mod registry;

pub mod mock;

pub use arxiv::{ArxivSource, ARXIV_API_URL};
pub use doaj::{DoajSource, PdfLinkPolicy, DOAJ_API_URL};
pub use gemini::{api_key_from_env, GeminiSource, DEFAULT_MODEL, GEMINI_API_URL};
pub use mock::MockSource;
pub use openlibrary::{OpenLibrarySource, OPENLIBRARY_URL};
pub use registry::SourceRegistry;

use crate::models::DocumentRecord;
use async_trait::async_trait;
use std::time::Duration;

/// Number of items requested from each provider
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// The Source trait defines the interface for all document providers.
///
/// # Implementing a New Source
///
/// 1. Create a struct that implements `Source`
/// 2. Issue exactly one outbound request per `search` call
/// 3. Default missing fields, drop records without a usable URL, keep provider order
/// 4. Register it with [`SourceRegistry::register`]
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "arxiv", "doaj")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Search the provider, reporting failures
    async fn search(&self, query: &str) -> Result<Vec<DocumentRecord>, SourceError>;

    /// Search the provider, turning any failure into an empty list
    async fn fetch(&self, query: &str) -> Vec<DocumentRecord> {
        absorb(self.id(), self.search(query).await).0
    }
}

/// Search `source`, giving up after `limit`
///
/// An elapsed deadline is reported as [`SourceError::Timeout`].
pub async fn search_within(
    source: &dyn Source,
    query: &str,
    limit: Duration,
) -> Result<Vec<DocumentRecord>, SourceError> {
    match tokio::time::timeout(limit, source.search(query)).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(limit)),
    }
}

/// Split a search result into documents and error, logging the error
///
/// A failed search yields no documents.
pub fn absorb(
    id: &str,
    result: Result<Vec<DocumentRecord>, SourceError>,
) -> (Vec<DocumentRecord>, Option<SourceError>) {
    match result {
        Ok(documents) => (documents, None),
        Err(e) => {
            tracing::warn!("Search failed for {}: {}", id, e);
            (Vec::new(), Some(e))
        }
    }
}

/// Errors that can occur when interacting with a source
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The provider did not answer in time
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Parsing error (XML, JSON)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters or missing credentials
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// API error from the source
    #[error("API error: {0}")]
    Api(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl SourceError {
    /// Whether the failure happened below the provider's API
    ///
    /// Network errors and timeouts count; an answer that was received but
    /// could not be used does not.
    pub fn is_transport(&self) -> bool {
        matches!(self, SourceError::Network(_) | SourceError::Timeout(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceLabel;
    use crate::sources::mock::make_documents;

    #[test]
    fn test_transport_classification() {
        assert!(SourceError::Network("refused".into()).is_transport());
        assert!(SourceError::Timeout(Duration::from_secs(1)).is_transport());
        assert!(!SourceError::Parse("bad json".into()).is_transport());
        assert!(!SourceError::Api("500".into()).is_transport());
        assert!(!SourceError::InvalidRequest("no key".into()).is_transport());
    }

    #[tokio::test]
    async fn test_fetch_absorbs_errors() {
        let source = MockSource::new("broken").failing(SourceError::Parse("boom".into()));
        assert!(source.fetch("anything").await.is_empty());
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_search_within_returns_results() {
        let source =
            MockSource::new("arxiv").with_documents(make_documents("arxiv", 2, SourceLabel::Arxiv));

        let result = tokio_test::block_on(search_within(&source, "topic", Duration::from_secs(1)));
        let documents = tokio_test::assert_ok!(result);
        assert_eq!(documents.len(), 2);
    }

    #[tokio::test]
    async fn test_search_within_reports_timeout() {
        let limit = Duration::from_millis(20);
        let source = MockSource::new("slow")
            .with_documents(make_documents("slow", 1, SourceLabel::Doaj))
            .with_delay(Duration::from_millis(500));

        let err = tokio_test::assert_err!(search_within(&source, "topic", limit).await);
        assert!(matches!(err, SourceError::Timeout(d) if d == limit));
        assert!(err.is_transport());
    }

    #[test]
    fn test_absorb_matches_fetch() {
        let failing = MockSource::new("broken").failing(SourceError::Api("500".into()));
        let fetched = tokio_test::block_on(failing.fetch("q"));
        let (documents, error) = absorb("broken", Err(SourceError::Api("500".into())));
        assert_eq!(documents, fetched);
        assert!(matches!(error, Some(SourceError::Api(_))));

        let (documents, error) = absorb("ok", Ok(make_documents("ok", 3, SourceLabel::Arxiv)));
        assert_eq!(documents.len(), 3);
        assert!(error.is_none());
    }
}
