//! Integration tests for Free PDF Search
//!
//! These tests drive the public API end to end: real adapters against a mock
//! HTTP server, and the aggregator over file and memory stores.

use free_pdf_search::aggregator::{Aggregator, AggregatorSettings, SearchError};
use free_pdf_search::config::Config;
use free_pdf_search::models::{DocumentRecord, SearchOutcome, SourceLabel};
use free_pdf_search::sources::mock::make_documents;
use free_pdf_search::sources::{MockSource, SourceError, SourceRegistry};
use free_pdf_search::utils::{
    BookmarkService, CacheService, FileStore, HistoryService, MemoryStore, Store,
};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

const ATOM_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>arXiv Query Results</title>
  <id>http://arxiv.org/api/query</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <id>http://arxiv.org/abs/2101.00001v1</id>
    <updated>2021-01-01T00:00:00Z</updated>
    <title>Graphene Electronics</title>
    <summary>Transport in graphene.</summary>
    <link title="pdf" href="https://arxiv.org/pdf/2101.00001v1" rel="related" type="application/pdf"/>
  </entry>
</feed>"#;

/// Config pointing every provider at the mock server
fn mocked_config(server_url: &str) -> Config {
    let mut config = Config::default();
    config.sources.arxiv_url = format!("{}/api/query", server_url);
    config.sources.doaj_url = format!("{}/doaj", server_url);
    config.sources.openlibrary_url = server_url.to_string();
    config.sources.timeout_seconds = 5;
    config.fallback.api_url = server_url.to_string();
    config.fallback.api_key = Some("test-key".to_string());
    config
}

fn memory_store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::new())
}

#[tokio::test]
async fn test_end_to_end_with_mocked_providers() {
    let mut server = mockito::Server::new_async().await;

    let arxiv = server
        .mock("GET", "/api/query")
        .match_query(Matcher::UrlEncoded("search_query".into(), "all:graphene".into()))
        .with_status(200)
        .with_body(ATOM_FEED)
        .expect(1)
        .create_async()
        .await;
    let doaj = server
        .mock("GET", "/doaj/graphene")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"results": [{"bibjson": {
                "title": "Graphene Membranes",
                "link": [{"type": "fulltext", "url": "https://journal.org/membranes.pdf"}]
            }}]})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let openlibrary = server
        .mock("GET", "/search.json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"numFound": 0, "docs": []}).to_string())
        .expect(1)
        .create_async()
        .await;
    let gemini = server
        .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"candidates": [{
                "content": {"parts": [{"text": "Two PDFs found."}]},
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://arxiv.org/pdf/2101.00001v1", "title": "Duplicate"}},
                    {"web": {"uri": "https://www.stanford.edu/graphene.pdf", "title": "Stanford Notes"}}
                ]}
            }]})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let aggregator = Aggregator::from_config(&mocked_config(&server.url()), memory_store()).unwrap();

    let outcome = aggregator.search("graphene").await.unwrap();
    let docs = outcome.documents();

    let urls: Vec<&str> = docs.iter().map(|d| d.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://arxiv.org/pdf/2101.00001v1",
            "https://journal.org/membranes.pdf",
            "https://www.stanford.edu/graphene.pdf",
        ]
    );
    assert_eq!(docs[0].source, SourceLabel::Arxiv);
    assert_eq!(docs[1].source, SourceLabel::Doaj);
    assert_eq!(docs[2].source, SourceLabel::Other("stanford.edu".into()));
    assert_eq!(docs[2].snippet.as_deref(), Some("Two PDFs found."));

    // Second search is served from the cache without new requests
    let again = aggregator.search("  GRAPHENE ").await.unwrap();
    assert!(again.is_cached());
    assert_eq!(again.documents(), docs);

    arxiv.assert_async().await;
    doaj.assert_async().await;
    openlibrary.assert_async().await;
    gemini.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_providers_report_network_failure() {
    let mut config = mocked_config("http://127.0.0.1:9");
    config.fallback.enabled = false;

    let store = memory_store();
    let aggregator = Aggregator::from_config(&config, Arc::clone(&store)).unwrap();

    let err = aggregator.search("anything").await.unwrap_err();
    assert!(matches!(err, SearchError::Network(_)));
    assert!(store.keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_results_survive_restart() {
    let dir = tempdir().unwrap();
    let source = Arc::new(
        MockSource::new("arxiv").with_documents(make_documents("arxiv", 3, SourceLabel::Arxiv)),
    );

    let build = |source: Arc<MockSource>| {
        let store: Arc<dyn Store> = Arc::new(FileStore::open(dir.path()).unwrap());
        Aggregator::new(
            SourceRegistry::empty().with_source(source),
            CacheService::new(Arc::clone(&store)),
            HistoryService::new(store),
        )
    };

    let first = build(Arc::clone(&source));
    let found = first.search("Linear Algebra").await.unwrap();
    assert_eq!(found.documents().len(), 3);
    drop(first);

    let second = build(Arc::clone(&source));
    let cached = second.search("linear algebra").await.unwrap();
    assert!(cached.is_cached());
    assert_eq!(cached.documents(), found.documents());
    assert_eq!(source.calls(), 1);

    let history = second.history().entries().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].query, "Linear Algebra");
}

#[tokio::test]
async fn test_disabled_cache_always_queries() {
    let source = Arc::new(
        MockSource::new("arxiv").with_documents(make_documents("arxiv", 3, SourceLabel::Arxiv)),
    );
    let store = memory_store();
    let aggregator = Aggregator::new(
        SourceRegistry::empty().with_source(source.clone()),
        CacheService::disabled(Arc::clone(&store)),
        HistoryService::new(store),
    );

    aggregator.search("topic").await.unwrap();
    let again = aggregator.search("topic").await.unwrap();
    assert!(!again.is_cached());
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_fallback_only_results() {
    let ai = Arc::new(MockSource::new("ai").with_documents(vec![DocumentRecord::new(
        "ai-1-0",
        "NASA Report",
        "https://nasa.gov/report.pdf",
        SourceLabel::Other("nasa.gov".into()),
    )]));
    let store = memory_store();
    let aggregator = Aggregator::new(
        SourceRegistry::empty()
            .with_source(Arc::new(MockSource::new("arxiv")))
            .with_source(Arc::new(
                MockSource::new("doaj").failing(SourceError::Api("DOAJ API returned status: 500".into())),
            ))
            .with_fallback(ai.clone()),
        CacheService::new(Arc::clone(&store)),
        HistoryService::new(Arc::clone(&store)),
    )
    .with_settings(AggregatorSettings {
        fallback_threshold: 3,
        source_timeout: Duration::from_secs(1),
    });

    let outcome = aggregator.search("mars rover").await.unwrap();
    match outcome {
        SearchOutcome::Found { documents, from_cache, .. } => {
            assert!(!from_cache);
            assert_eq!(documents.len(), 1);
            assert_eq!(documents[0].source.to_string(), "nasa.gov");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(ai.calls(), 1);
}

#[test]
fn test_bookmarks_persist_in_file_store() {
    let dir = tempdir().unwrap();
    let doc = DocumentRecord::new(
        "ol-1-0",
        "Calculus",
        "https://openlibrary.org/works/OL1W",
        SourceLabel::OpenLibrary,
    );

    {
        let bookmarks = BookmarkService::new(Arc::new(FileStore::open(dir.path()).unwrap()));
        assert!(bookmarks.toggle(&doc).unwrap());
    }

    let bookmarks = BookmarkService::new(Arc::new(FileStore::open(dir.path()).unwrap()));
    assert_eq!(bookmarks.list().unwrap(), vec![doc]);
}

#[test]
fn test_unknown_store_version_is_ignored() {
    let dir = tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    store
        .set(
            "history",
            &json!({
                "version": 99,
                "key": "history",
                "saved_at": "2030-01-01T00:00:00Z",
                "data": [{"query": "from the future", "timestamp": "2030-01-01T00:00:00Z"}]
            })
            .to_string(),
        )
        .unwrap();

    let history = HistoryService::new(store);
    assert!(history.entries().unwrap().is_empty());

    // A new write replaces the unreadable entry
    history.add_search("fresh").unwrap();
    assert_eq!(history.entries().unwrap()[0].query, "fresh");
}
