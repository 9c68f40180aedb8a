//! DOAJ (Directory of Open Access Journals) source implementation.
//!
//! Uses the DOAJ article search API and keeps articles whose full-text link
//! passes the [`PdfLinkPolicy`].
//! API documentation: <https://doaj.org/api/v2>

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{record_id, DocumentRecord, SourceLabel};
use crate::sources::{Source, SourceError, DEFAULT_MAX_RESULTS};
use crate::utils::{non_empty, truncate_snippet, HttpClient, SNIPPET_CHARS};

/// Base URL for DOAJ article search
pub const DOAJ_API_URL: &str = "https://doaj.org/api/v2/search/articles";

const DEFAULT_TITLE: &str = "Academic Article";
const DEFAULT_PDF_PATTERN: &str = "(?i)pdf";

/// Decides whether a DOAJ full-text link points at a PDF.
///
/// DOAJ does not say which full-text links are PDFs, so the link URL is
/// matched against a pattern. `None` accepts every link.
#[derive(Debug, Clone)]
pub struct PdfLinkPolicy {
    pattern: Option<Regex>,
}

impl PdfLinkPolicy {
    /// Accept URLs matching `pattern`; an empty pattern accepts everything
    pub fn from_pattern(pattern: &str) -> Result<Self, SourceError> {
        if pattern.trim().is_empty() {
            return Ok(Self::accept_all());
        }
        let regex = Regex::new(pattern).map_err(|e| {
            SourceError::InvalidRequest(format!("Invalid PDF link pattern '{}': {}", pattern, e))
        })?;
        Ok(Self {
            pattern: Some(regex),
        })
    }

    /// Accept every full-text link
    pub fn accept_all() -> Self {
        Self { pattern: None }
    }

    pub fn accepts(&self, url: &str) -> bool {
        match &self.pattern {
            Some(re) => re.is_match(url),
            None => true,
        }
    }
}

impl Default for PdfLinkPolicy {
    fn default() -> Self {
        // The default pattern is a literal and always compiles
        Self::from_pattern(DEFAULT_PDF_PATTERN).unwrap_or_else(|_| Self::accept_all())
    }
}

/// DOAJ source
#[derive(Debug, Clone)]
pub struct DoajSource {
    client: Arc<HttpClient>,
    base_url: String,
    max_results: usize,
    policy: PdfLinkPolicy,
}

impl DoajSource {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(Arc::new(HttpClient::new()?)))
    }

    pub fn with_client(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: DOAJ_API_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            policy: PdfLinkPolicy::default(),
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

    /// Replace the full-text link filter
    pub fn pdf_policy(mut self, policy: PdfLinkPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/{}?pageSize={}",
            self.base_url,
            urlencoding::encode(query),
            self.max_results
        )
    }

    /// Map the raw result items, skipping ones that do not decode
    fn parse_results(&self, results: Vec<serde_json::Value>) -> Vec<DocumentRecord> {
        let created = Utc::now();

        results
            .into_iter()
            .enumerate()
            .filter_map(|(idx, value)| {
                let item: DoajItem = match serde_json::from_value(value) {
                    Ok(item) => item,
                    Err(e) => {
                        tracing::debug!("Skipping undecodable DOAJ item {}: {}", idx, e);
                        return None;
                    }
                };
                let bibjson = item.bibjson?;

                let url = bibjson
                    .link
                    .iter()
                    .find(|l| l.link_type.as_deref() == Some("fulltext"))
                    .and_then(|l| l.url.as_deref())
                    .map(str::trim)
                    .filter(|u| !u.is_empty() && self.policy.accepts(u))?;

                let title = non_empty(bibjson.title.as_deref())
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string());

                let mut doc = DocumentRecord::new(
                    record_id("doaj", created, idx),
                    title,
                    url,
                    SourceLabel::Doaj,
                )
                .with_timestamp(created);

                if let Some(abstract_text) = non_empty(bibjson.abstract_text.as_deref()) {
                    doc = doc.with_snippet(truncate_snippet(&abstract_text, SNIPPET_CHARS));
                }

                Some(doc)
            })
            .collect()
    }
}

#[async_trait]
impl Source for DoajSource {
    fn id(&self) -> &str {
        "doaj"
    }

    fn name(&self) -> &str {
        "DOAJ"
    }

    async fn search(&self, query: &str) -> Result<Vec<DocumentRecord>, SourceError> {
        let url = self.search_url(query);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to search DOAJ: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "DOAJ API returned status: {}",
                response.status()
            )));
        }

        let data: DoajResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse DOAJ response: {}", e)))?;

        Ok(self.parse_results(data.results))
    }
}

// DOAJ API response types

#[derive(Debug, Deserialize)]
struct DoajResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DoajItem {
    bibjson: Option<DoajBibJson>,
}

#[derive(Debug, Deserialize)]
struct DoajBibJson {
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(default)]
    link: Vec<DoajLink>,
}

#[derive(Debug, Deserialize)]
struct DoajLink {
    #[serde(rename = "type")]
    link_type: Option<String>,
    url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn source() -> DoajSource {
        DoajSource::with_client(Arc::new(HttpClient::new().unwrap()))
    }

    #[test]
    fn test_pdf_policy() {
        let policy = PdfLinkPolicy::default();
        assert!(policy.accepts("https://journal.org/article/view/12/PDF"));
        assert!(policy.accepts("https://journal.org/paper.pdf"));
        assert!(!policy.accepts("https://journal.org/article/view/12"));

        assert!(PdfLinkPolicy::accept_all().accepts("https://journal.org/article/view/12"));
        assert!(PdfLinkPolicy::from_pattern("").unwrap().accepts("anything"));

        let custom = PdfLinkPolicy::from_pattern(r"/download/").unwrap();
        assert!(custom.accepts("https://journal.org/download/12"));
        assert!(!custom.accepts("https://journal.org/paper.pdf"));

        assert!(matches!(
            PdfLinkPolicy::from_pattern("(unclosed"),
            Err(SourceError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_parse_results() {
        let results = vec![
            json!({"bibjson": {
                "title": "Graphene Membranes",
                "abstract": "Two-dimensional carbon.",
                "link": [
                    {"type": "homepage", "url": "https://journal.org/home.pdf"},
                    {"type": "fulltext", "url": "https://journal.org/graphene.pdf"}
                ]
            }}),
            // Full-text link that fails the policy
            json!({"bibjson": {
                "title": "HTML Only",
                "link": [{"type": "fulltext", "url": "https://journal.org/article/5"}]
            }}),
            // Undecodable item
            json!({"bibjson": {"title": 42}}),
            // No bibjson at all
            json!({"id": "abc"}),
            json!({"bibjson": {
                "link": [{"type": "fulltext", "url": "https://journal.org/download/PDF/7"}]
            }}),
        ];

        let docs = source().parse_results(results);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "Graphene Membranes");
        assert_eq!(docs[0].url, "https://journal.org/graphene.pdf");
        assert_eq!(docs[0].snippet.as_deref(), Some("Two-dimensional carbon."));
        assert!(docs[0].id.starts_with("doaj-"));
        assert_eq!(docs[1].title, DEFAULT_TITLE);
        assert_eq!(docs[1].source, SourceLabel::Doaj);
    }

    #[test]
    fn test_accept_all_policy_keeps_html_links() {
        let results = vec![json!({"bibjson": {
            "title": "HTML Only",
            "link": [{"type": "fulltext", "url": "https://journal.org/article/5"}]
        }})];

        let docs = source()
            .pdf_policy(PdfLinkPolicy::accept_all())
            .parse_results(results);
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_search_with_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search/articles/graphene")
            .match_query(Matcher::UrlEncoded("pageSize".into(), "5".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"total": 1, "results": [{"bibjson": {
                    "title": "Graphene",
                    "link": [{"type": "fulltext", "url": "https://journal.org/g.pdf"}]
                }}]})
                .to_string(),
            )
            .create_async()
            .await;

        let docs = source()
            .base_url(format!("{}/search/articles", server.url()))
            .search("graphene")
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].url, "https://journal.org/g.pdf");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let doaj = source().base_url(server.url());
        let result = doaj.search("graphene").await;
        assert!(matches!(result, Err(SourceError::Parse(_))));
        assert!(!result.unwrap_err().is_transport());
    }
}
