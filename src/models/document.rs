//! Document record representing one search hit from any source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The provider a document was found through
///
/// The free sources form a fixed vocabulary; AI-grounded hits are labelled
/// with the hostname they point at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceLabel {
    Arxiv,
    Doaj,
    OpenLibrary,
    WebSearch,
    Other(String),
}

impl SourceLabel {
    /// Returns the display name of the source
    pub fn name(&self) -> &str {
        match self {
            SourceLabel::Arxiv => "arXiv",
            SourceLabel::Doaj => "DOAJ",
            SourceLabel::OpenLibrary => "OpenLibrary",
            SourceLabel::WebSearch => "Web Search",
            SourceLabel::Other(s) => s,
        }
    }

    /// Parse a display name back into a label
    pub fn from_name(name: &str) -> Self {
        match name {
            "arXiv" => SourceLabel::Arxiv,
            "DOAJ" => SourceLabel::Doaj,
            "OpenLibrary" => SourceLabel::OpenLibrary,
            "Web Search" => SourceLabel::WebSearch,
            other => SourceLabel::Other(other.to_string()),
        }
    }

    /// Label for a web reference, derived from its hostname
    ///
    /// A leading `www.` is stripped. Falls back to [`SourceLabel::WebSearch`]
    /// when the URL has no parseable host.
    pub fn from_url(uri: &str) -> Self {
        url::Url::parse(uri)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .filter(|h| !h.is_empty())
            .map(|h| SourceLabel::Other(h.strip_prefix("www.").unwrap_or(&h).to_string()))
            .unwrap_or(SourceLabel::WebSearch)
    }
}

impl std::fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for SourceLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for SourceLabel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(SourceLabel::from_name(&name))
    }
}

/// A normalized search result
///
/// Two records with the same `url` are the same document, whatever the
/// other fields say.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Source-prefixed unique identifier (e.g. `arxiv-1700000000000-0`)
    pub id: String,

    /// Display title, never empty
    pub title: String,

    /// Absolute link to the document; the identity key
    pub url: String,

    /// Provider label
    pub source: SourceLabel,

    /// Short description, already truncated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    /// When the record was created
    pub timestamp: DateTime<Utc>,
}

impl DocumentRecord {
    /// Create a record stamped with the current time
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        source: SourceLabel,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            source,
            snippet: None,
            timestamp: Utc::now(),
        }
    }

    /// Set the snippet
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Override the creation time
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether the record points at something that looks like a PDF file
    pub fn is_direct_pdf(&self) -> bool {
        self.url.to_lowercase().ends_with(".pdf")
    }
}

/// Build a source-prefixed record id
///
/// The millisecond timestamp keeps ids from successive searches apart; the
/// index keeps them apart within one provider response.
pub fn record_id(prefix: &str, created: DateTime<Utc>, index: usize) -> String {
    format!("{}-{}-{}", prefix, created.timestamp_millis(), index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_label_names() {
        assert_eq!(SourceLabel::Arxiv.name(), "arXiv");
        assert_eq!(SourceLabel::Doaj.to_string(), "DOAJ");
        assert_eq!(SourceLabel::from_name("OpenLibrary"), SourceLabel::OpenLibrary);
        assert_eq!(
            SourceLabel::from_name("mit.edu"),
            SourceLabel::Other("mit.edu".to_string())
        );
    }

    #[test]
    fn test_source_label_from_url() {
        assert_eq!(
            SourceLabel::from_url("https://www.cs.stanford.edu/notes/lecture1.pdf"),
            SourceLabel::Other("cs.stanford.edu".to_string())
        );
        // Only a leading www. is stripped
        assert_eq!(
            SourceLabel::from_url("https://files.www.example.org/a.pdf"),
            SourceLabel::Other("files.www.example.org".to_string())
        );
        assert_eq!(SourceLabel::from_url("not a url"), SourceLabel::WebSearch);
    }

    #[test]
    fn test_record_serializes_source_as_string() {
        let record = DocumentRecord::new(
            "arxiv-1-0",
            "Test Paper",
            "https://arxiv.org/pdf/2301.12345",
            SourceLabel::Arxiv,
        )
        .with_snippet("Abstract...");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source"], "arXiv");
        assert_eq!(json["snippet"], "Abstract...");

        let back: DocumentRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_record_id_is_prefixed() {
        let created = Utc::now();
        let id = record_id("doaj", created, 3);
        assert!(id.starts_with("doaj-"));
        assert!(id.ends_with("-3"));
    }
}
