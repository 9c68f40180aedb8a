//! Core data models for documents and search outcomes.

mod document;
mod search;

pub use document::{record_id, DocumentRecord, SourceLabel};
pub use search::{normalize_query, SearchOutcome, NO_RESULTS_MESSAGE};
