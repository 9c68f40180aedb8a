//! Utility modules supporting the search pipeline.
//!
//! - [`deduplicate_by_url`]: Drop later documents that share a URL with an earlier one
//! - [`HttpClient`]: Shared HTTP client with timeouts
//! - [`Store`], [`FileStore`], [`MemoryStore`]: Key-value persistence with a versioned envelope
//! - [`CacheService`]: Per-query result cache on top of a store
//! - [`HistoryService`]: Bounded, deduplicated recent-query log
//! - [`BookmarkService`]: Saved library keyed by URL
//! - [`truncate_snippet`]: Character-budget truncation used by the source adapters
//!
//! # Deduplication
//!
//! ```rust
//! use free_pdf_search::utils::deduplicate_by_url;
//! use free_pdf_search::models::{DocumentRecord, SourceLabel};
//!
//! let docs = vec![
//!     DocumentRecord::new("arxiv-1", "A", "https://x.org/a.pdf", SourceLabel::Arxiv),
//!     DocumentRecord::new("doaj-1", "A again", "https://x.org/a.pdf", SourceLabel::Doaj),
//! ];
//! let unique = deduplicate_by_url(docs);
//! assert_eq!(unique.len(), 1);
//! assert_eq!(unique[0].id, "arxiv-1");
//! ```

mod bookmarks;
mod cache;
mod dedup;
pub mod display;
mod history;
mod http;
pub mod store;
mod text;

pub use bookmarks::{BookmarkService, BOOKMARKS_KEY};
pub use cache::{CacheResult, CacheService, CacheStats};
pub use dedup::{deduplicate_by_url, find_duplicates};
pub use display::{is_terminal, terminal_width, truncate_with_ellipsis};
pub use history::{
    prepend_dedup_cap, HistoryEntry, HistoryService, DEFAULT_HISTORY_LIMIT, HISTORY_KEY,
};
pub use http::{HttpClient, DEFAULT_TIMEOUT};
pub use store::{load_json, save_json, FileStore, MemoryStore, Store, StoreError};
pub use text::{collapse_whitespace, non_empty, truncate_snippet, AI_SNIPPET_CHARS, SNIPPET_CHARS};
