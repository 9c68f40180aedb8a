//! Saved library of bookmarked documents.

use std::sync::Arc;

use crate::models::DocumentRecord;
use crate::utils::store::{load_json, save_json, Store, StoreError};

/// Store key holding the bookmark list
pub const BOOKMARKS_KEY: &str = "bookmarks";

/// Bookmarks keyed by document URL, newest first
#[derive(Debug, Clone)]
pub struct BookmarkService {
    store: Arc<dyn Store>,
}

impl BookmarkService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// All bookmarks, newest first
    pub fn list(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        Ok(load_json(self.store.as_ref(), BOOKMARKS_KEY)?.unwrap_or_default())
    }

    /// Whether a document with this URL is bookmarked
    pub fn contains(&self, url: &str) -> Result<bool, StoreError> {
        Ok(self.list()?.iter().any(|b| b.url == url))
    }

    /// Add the document, or remove it if its URL is already bookmarked
    ///
    /// Returns `true` when the document is bookmarked afterwards.
    pub fn toggle(&self, document: &DocumentRecord) -> Result<bool, StoreError> {
        let mut bookmarks = self.list()?;
        let before = bookmarks.len();
        bookmarks.retain(|b| b.url != document.url);

        let added = bookmarks.len() == before;
        if added {
            bookmarks.insert(0, document.clone());
        }

        save_json(self.store.as_ref(), BOOKMARKS_KEY, &bookmarks)?;
        Ok(added)
    }

    /// Remove the bookmark with this URL; returns whether one was removed
    pub fn remove(&self, url: &str) -> Result<bool, StoreError> {
        let mut bookmarks = self.list()?;
        let before = bookmarks.len();
        bookmarks.retain(|b| b.url != url);

        if bookmarks.len() == before {
            return Ok(false);
        }
        save_json(self.store.as_ref(), BOOKMARKS_KEY, &bookmarks)?;
        Ok(true)
    }
}
