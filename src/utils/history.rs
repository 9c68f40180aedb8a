//! Recent search history.
//!
//! The history is a most-recent-first list stored under a single key. A
//! repeated query moves to the front instead of appearing twice, and the list
//! is capped (15 entries by default).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::utils::store::{load_json, save_json, Store, StoreError};

/// Store key holding the history list
pub const HISTORY_KEY: &str = "history";

/// Default number of entries kept
pub const DEFAULT_HISTORY_LIMIT: usize = 15;

/// A single history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Query as the user typed it (trimmed)
    pub query: String,
    /// When the search ran
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Put `entry` at the front of `list`, drop older entries with the same query
/// and keep at most `max` entries
pub fn prepend_dedup_cap(
    entry: HistoryEntry,
    list: Vec<HistoryEntry>,
    max: usize,
) -> Vec<HistoryEntry> {
    let mut out = Vec::with_capacity(max.min(list.len() + 1));
    let query = entry.query.clone();
    out.push(entry);
    out.extend(list.into_iter().filter(|e| e.query != query));
    out.truncate(max);
    out
}

/// History service
#[derive(Debug, Clone)]
pub struct HistoryService {
    store: Arc<dyn Store>,
    limit: usize,
}

impl HistoryService {
    /// Create a history service with the default limit
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_limit(store, DEFAULT_HISTORY_LIMIT)
    }

    /// Create a history service keeping at most `limit` entries
    pub fn with_limit(store: Arc<dyn Store>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Maximum number of entries kept
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record a search
    pub fn add_search(&self, query: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        let entries = prepend_dedup_cap(HistoryEntry::new(query.trim()), self.entries()?, self.limit);
        save_json(self.store.as_ref(), HISTORY_KEY, &entries)?;
        Ok(entries)
    }

    /// All entries, newest first
    pub fn entries(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(load_json(self.store.as_ref(), HISTORY_KEY)?.unwrap_or_default())
    }

    /// The newest `limit` entries
    pub fn read_entries(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut entries = self.entries()?;
        entries.truncate(limit);
        Ok(entries)
    }

    /// Clear history
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(HISTORY_KEY)
    }
}
