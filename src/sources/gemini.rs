//! Gemini fallback source.
//!
//! Asks Gemini, with the Google Search tool enabled, for downloadable PDFs on
//! a topic. The answer text itself is not used as a result: each grounding
//! chunk that cites a web page becomes one document, and the answer becomes
//! their shared snippet.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::models::{record_id, DocumentRecord, SourceLabel};
use crate::sources::{Source, SourceError};
use crate::utils::{non_empty, truncate_snippet, HttpClient, AI_SNIPPET_CHARS};

/// Base URL for the Generative Language API
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_TITLE: &str = "Found PDF";
const NO_ANSWER_SNIPPET: &str = "PDF found via AI search grounding.";

/// Gemini source with Google Search grounding
#[derive(Clone)]
pub struct GeminiSource {
    client: Arc<HttpClient>,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

// Keep the key out of debug output
impl std::fmt::Debug for GeminiSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSource")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiSource {
    /// Create a source reading its key from `GEMINI_API_KEY` or `GOOGLE_API_KEY`
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(Arc::new(HttpClient::new()?)).api_key(api_key_from_env()))
    }

    /// Create with a custom HTTP client and no key
    pub fn with_client(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    pub fn api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether a key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn prompt(query: &str) -> String {
        format!(
            "Find specific, downloadable PDF files for the topic: \"{}\". \
             Prioritize direct download links from educational (.edu), government (.gov), \
             or known research repositories.",
            query
        )
    }

    fn parse_response(response: GenerateContentResponse) -> Vec<DocumentRecord> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            return Vec::new();
        };

        let answer = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        let snippet = if answer.trim().is_empty() {
            NO_ANSWER_SNIPPET.to_string()
        } else {
            truncate_snippet(&answer, AI_SNIPPET_CHARS)
        };

        let chunks = candidate
            .grounding_metadata
            .map(|m| m.grounding_chunks)
            .unwrap_or_default();

        let created = Utc::now();
        chunks
            .into_iter()
            .filter_map(|chunk| chunk.web)
            .filter_map(|web| {
                let uri = web.uri.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;
                Some((uri, web.title))
            })
            .enumerate()
            .map(|(idx, (uri, title))| {
                let title = non_empty(title.as_deref()).unwrap_or_else(|| DEFAULT_TITLE.to_string());
                let source = SourceLabel::from_url(&uri);
                DocumentRecord::new(record_id("ai", created, idx), title, uri, source)
                    .with_snippet(snippet.clone())
                    .with_timestamp(created)
            })
            .collect()
    }
}

/// Key from `GEMINI_API_KEY`, else `GOOGLE_API_KEY`
pub fn api_key_from_env() -> Option<String> {
    ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|v| !v.trim().is_empty())
}

#[async_trait]
impl Source for GeminiSource {
    fn id(&self) -> &str {
        "gemini"
    }

    fn name(&self) -> &str {
        "Gemini Search"
    }

    async fn search(&self, query: &str) -> Result<Vec<DocumentRecord>, SourceError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::InvalidRequest("Gemini API key not set".into()))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            urlencoding::encode(key)
        );

        let body = json!({
            "contents": [ { "role": "user", "parts": [ { "text": Self::prompt(query) } ] } ],
            "tools": [ { "googleSearch": {} } ]
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to call Gemini: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(format!(
                "Gemini API error: {} - {}",
                status,
                truncate_snippet(&detail, 200)
            )));
        }

        let data: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse Gemini response: {}", e.without_url())))?;

        let documents = Self::parse_response(data);
        tracing::debug!("Gemini grounding returned {} references", documents.len());
        Ok(documents)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}
