//! arXiv source implementation.
//!
//! Queries the arXiv Atom API and keeps only entries that carry a PDF link.

use async_trait::async_trait;
use chrono::Utc;
use feed_rs::parser;
use std::sync::Arc;

use crate::models::{record_id, DocumentRecord, SourceLabel};
use crate::sources::{Source, SourceError, DEFAULT_MAX_RESULTS};
use crate::utils::{non_empty, truncate_snippet, HttpClient, SNIPPET_CHARS};

/// Base URL for arXiv API
pub const ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";

const DEFAULT_TITLE: &str = "Research Paper";

/// arXiv source
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: Arc<HttpClient>,
    base_url: String,
    max_results: usize,
}

impl ArxivSource {
    /// Create a new arXiv source
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(Arc::new(HttpClient::new()?)))
    }

    /// Create with a custom HTTP client
    pub fn with_client(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: ARXIV_API_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Point the source at another API endpoint
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the number of entries requested
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}?search_query={}&start=0&max_results={}",
            self.base_url,
            urlencoding::encode(&format!("all:{}", query)),
            self.max_results
        )
    }

    /// The PDF link of an entry: the one titled "pdf", else one typed as a PDF
    fn pdf_link(entry: &feed_rs::model::Entry) -> Option<&str> {
        entry
            .links
            .iter()
            .find(|l| l.title.as_deref() == Some("pdf"))
            .or_else(|| {
                entry
                    .links
                    .iter()
                    .find(|l| l.media_type.as_deref() == Some("application/pdf"))
            })
            .map(|l| l.href.trim())
            .filter(|href| !href.is_empty())
    }

    /// Map the parsed feed to documents, dropping entries without a PDF link
    fn parse_feed(feed: &feed_rs::model::Feed) -> Vec<DocumentRecord> {
        let created = Utc::now();

        feed.entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| {
                let url = Self::pdf_link(entry)?;

                let title = non_empty(entry.title.as_ref().map(|t| t.content.as_str()))
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string());

                let mut doc = DocumentRecord::new(
                    record_id("arxiv", created, idx),
                    title,
                    url,
                    SourceLabel::Arxiv,
                )
                .with_timestamp(created);

                if let Some(summary) = non_empty(entry.summary.as_ref().map(|s| s.content.as_str())) {
                    doc = doc.with_snippet(truncate_snippet(&summary, SNIPPET_CHARS));
                }

                Some(doc)
            })
            .collect()
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    async fn search(&self, query: &str) -> Result<Vec<DocumentRecord>, SourceError> {
        let url = self.search_url(query);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/atom+xml")
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch arXiv results: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "arXiv API returned status: {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        let feed = parser::parse(bytes.as_ref())
            .map_err(|e| SourceError::Parse(format!("Failed to parse Atom feed: {}", e)))?;

        let documents = Self::parse_feed(&feed);
        tracing::debug!(
            "arXiv returned {} entries, {} with PDF links",
            feed.entries.len(),
            documents.len()
        );
        Ok(documents)
    }
}
