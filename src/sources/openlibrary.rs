//! OpenLibrary source implementation.
//!
//! Searches the OpenLibrary catalogue. Hits link to the work page rather
//! than a file, since OpenLibrary serves books through its own reader.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{record_id, DocumentRecord, SourceLabel};
use crate::sources::{Source, SourceError, DEFAULT_MAX_RESULTS};
use crate::utils::{non_empty, truncate_snippet, HttpClient, SNIPPET_CHARS};

/// Base URL for OpenLibrary
pub const OPENLIBRARY_URL: &str = "https://openlibrary.org";

const DEFAULT_TITLE: &str = "Book";

/// OpenLibrary source
#[derive(Debug, Clone)]
pub struct OpenLibrarySource {
    client: Arc<HttpClient>,
    base_url: String,
    max_results: usize,
}

impl OpenLibrarySource {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(Arc::new(HttpClient::new()?)))
    }

    pub fn with_client(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: OPENLIBRARY_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search.json?q={}&limit={}",
            self.base_url,
            urlencoding::encode(query),
            self.max_results
        )
    }

    fn parse_docs(&self, docs: Vec<serde_json::Value>) -> Vec<DocumentRecord> {
        let created = Utc::now();

        docs.into_iter()
            .enumerate()
            .filter_map(|(idx, value)| {
                let doc: OpenLibraryDoc = match serde_json::from_value(value) {
                    Ok(doc) => doc,
                    Err(e) => {
                        tracing::debug!("Skipping undecodable OpenLibrary doc {}: {}", idx, e);
                        return None;
                    }
                };

                let key = doc.key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
                let url = format!("{}{}", self.base_url, key);

                let title = non_empty(doc.title.as_deref())
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string());

                let authors = if doc.author_name.is_empty() {
                    "Unknown Author".to_string()
                } else {
                    doc.author_name.join(", ")
                };
                let year = doc
                    .first_publish_year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                let snippet = format!("By {}. First published in {}.", authors, year);

                Some(
                    DocumentRecord::new(
                        record_id("ol", created, idx),
                        title,
                        url,
                        SourceLabel::OpenLibrary,
                    )
                    .with_snippet(truncate_snippet(&snippet, SNIPPET_CHARS))
                    .with_timestamp(created),
                )
            })
            .collect()
    }
}

#[async_trait]
impl Source for OpenLibrarySource {
    fn id(&self) -> &str {
        "openlibrary"
    }

    fn name(&self) -> &str {
        "OpenLibrary"
    }

    async fn search(&self, query: &str) -> Result<Vec<DocumentRecord>, SourceError> {
        let url = self.search_url(query);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to search OpenLibrary: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "OpenLibrary returned status: {}",
                response.status()
            )));
        }

        let data: OpenLibraryResponse = response.json().await.map_err(|e| {
            SourceError::Parse(format!("Failed to parse OpenLibrary response: {}", e))
        })?;

        Ok(self.parse_docs(data.docs))
    }
}

#[derive(Debug, Deserialize)]
struct OpenLibraryResponse {
    #[serde(default)]
    docs: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryDoc {
    key: Option<String>,
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    first_publish_year: Option<i32>,
}
