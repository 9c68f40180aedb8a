//! # Free PDF Search
//!
//! Searches free document indexes (arXiv, DOAJ, OpenLibrary) for a topic,
//! falls back to Gemini with Google Search grounding when they come back
//! thin, and merges everything into one deduplicated, locally cached list.
//!
//! ## Architecture
//!
//! - [`models`]: Document records and search outcomes
//! - [`sources`]: Provider adapters behind the [`Source`] trait
//! - [`aggregator`]: Concurrent fan-out, fallback policy, merge and persistence
//! - [`utils`]: Persistent store, cache, history, bookmarks, HTTP and display helpers
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal styling for the CLI

pub mod aggregator;
pub mod config;
pub mod models;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use aggregator::{Aggregator, AggregatorSettings, SearchError};
pub use models::{DocumentRecord, SearchOutcome, SourceLabel};
pub use sources::{Source, SourceError, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
