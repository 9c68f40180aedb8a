//! Search outcome models.

use serde::{Deserialize, Serialize};

use super::DocumentRecord;

/// Message shown when a search completes without any document
pub const NO_RESULTS_MESSAGE: &str = "No PDFs found for this topic. Try a broader term.";

/// Normalize a query into its cache key form (trimmed, case-folded)
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Terminal state of a search request that did not fail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Documents were found, either freshly or from the local cache
    Found {
        query: String,
        documents: Vec<DocumentRecord>,
        from_cache: bool,
    },

    /// Every source came back empty
    NoResults { query: String, message: String },

    /// A newer search started while this one was in flight; its result was dropped
    Superseded { query: String },
}

impl SearchOutcome {
    /// Build the empty-result outcome with the standard advisory message
    pub fn no_results(query: impl Into<String>) -> Self {
        SearchOutcome::NoResults {
            query: query.into(),
            message: NO_RESULTS_MESSAGE.to_string(),
        }
    }

    /// Documents carried by this outcome (empty unless `Found`)
    pub fn documents(&self) -> &[DocumentRecord] {
        match self {
            SearchOutcome::Found { documents, .. } => documents,
            _ => &[],
        }
    }

    /// Whether the documents came from the cache
    pub fn is_cached(&self) -> bool {
        matches!(self, SearchOutcome::Found { from_cache: true, .. })
    }

    /// The query this outcome answers
    pub fn query(&self) -> &str {
        match self {
            SearchOutcome::Found { query, .. }
            | SearchOutcome::NoResults { query, .. }
            | SearchOutcome::Superseded { query } => query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  Quantum Computing "), "quantum computing");
        assert_eq!(normalize_query("LINEAR algebra"), "linear algebra");
        assert_eq!(normalize_query("   "), "");
    }

    #[test]
    fn test_no_results_outcome() {
        let outcome = SearchOutcome::no_results("xyzzy");
        assert!(outcome.documents().is_empty());
        assert!(!outcome.is_cached());
        assert_eq!(outcome.query(), "xyzzy");
        match outcome {
            SearchOutcome::NoResults { message, .. } => assert_eq!(message, NO_RESULTS_MESSAGE),
            _ => panic!("Expected NoResults"),
        }
    }
}
