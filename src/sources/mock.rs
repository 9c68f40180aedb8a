//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{DocumentRecord, SourceLabel};
use crate::sources::{Source, SourceError};

/// A mock source that returns a predefined response and counts its calls.
#[derive(Debug)]
pub struct MockSource {
    id: String,
    response: Mutex<Result<Vec<DocumentRecord>, SourceError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a mock source that returns no documents.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            response: Mutex::new(Ok(Vec::new())),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Return these documents from every search.
    pub fn with_documents(self, documents: Vec<DocumentRecord>) -> Self {
        self.set_response(Ok(documents));
        self
    }

    /// Fail every search with this error.
    pub fn failing(self, error: SourceError) -> Self {
        self.set_response(Err(error));
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the configured response.
    pub fn set_response(&self, response: Result<Vec<DocumentRecord>, SourceError>) {
        let mut guard = self.response.lock().unwrap_or_else(|e| e.into_inner());
        *guard = response;
    }

    /// Number of times `search` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn search(&self, _query: &str) -> Result<Vec<DocumentRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.response
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Helper to create `count` distinct documents for testing.
///
/// URLs have the form `https://<prefix>.example.org/<i>.pdf`.
pub fn make_documents(prefix: &str, count: usize, source: SourceLabel) -> Vec<DocumentRecord> {
    (0..count)
        .map(|i| make_document(prefix, &format!("https://{}.example.org/{}.pdf", prefix, i), source.clone()))
        .collect()
}

/// Helper to create one document with a given URL.
pub fn make_document(prefix: &str, url: &str, source: SourceLabel) -> DocumentRecord {
    DocumentRecord::new(
        format!("{}-{}", prefix, url),
        format!("{} document", prefix),
        url,
        source,
    )
}
