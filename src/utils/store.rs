//! Key-value persistence behind the cache, history and bookmarks.
//!
//! The [`Store`] trait is small: string keys, string values,
//! synchronous calls. Typed data goes through [`load_json`] and
//! [`save_json`], which wrap it in a versioned envelope so the on-disk format
//! can change later without misreading old entries.
//!
//! # On-disk layout of [`FileStore`]
//!
//! ```text
//! ~/.cache/free-pdf-search/
//!   <md5 of key>.json
//! ```

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Current format version of persisted values
pub const STORE_SCHEMA_VERSION: u32 = 1;

/// Errors raised by a store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// File system failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Internal lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Synchronous string key-value store
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Read the raw value under `key`
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// All keys currently stored
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Envelope written around every typed value
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    key: String,
    saved_at: DateTime<Utc>,
    data: T,
}

/// Header used to read the key of an entry without decoding its payload
#[derive(Debug, Deserialize)]
struct EnvelopeHeader {
    version: u32,
    key: String,
}

/// Read and decode the typed value under `key`
///
/// Entries written by another schema version, or that no longer decode, are
/// reported as absent.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn Store,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    match serde_json::from_str::<Envelope<T>>(&raw) {
        Ok(envelope) if envelope.version == STORE_SCHEMA_VERSION => Ok(Some(envelope.data)),
        Ok(envelope) => {
            tracing::warn!(
                "Ignoring entry '{}' with schema version {} (expected {})",
                key,
                envelope.version,
                STORE_SCHEMA_VERSION
            );
            Ok(None)
        }
        Err(e) => {
            tracing::warn!("Ignoring unreadable entry '{}': {}", key, e);
            Ok(None)
        }
    }
}

/// Encode `data` in a versioned envelope and write it under `key`
pub fn save_json<T: Serialize>(store: &dyn Store, key: &str, data: &T) -> Result<(), StoreError> {
    let envelope = Envelope {
        version: STORE_SCHEMA_VERSION,
        key: key.to_string(),
        saved_at: Utc::now(),
        data,
    };
    store.set(key, &serde_json::to_string(&envelope)?)
}

/// Store keeping one JSON file per key in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        tracing::debug!("File store opened at: {}", dir.display());
        Ok(Self { dir })
    }

    /// Directory backing this store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{:x}.json", md5::compute(key.as_bytes())))
    }

    /// Total size of the stored files in bytes
    pub fn size_bytes(&self) -> u64 {
        fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .flatten()
                    .filter_map(|e| e.metadata().ok())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0)
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // Write to a sibling file then rename, so readers never see half a value
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            match serde_json::from_str::<EnvelopeHeader>(&content) {
                Ok(header) if header.version == STORE_SCHEMA_VERSION => keys.push(header.key),
                _ => tracing::debug!("Skipping foreign file in store: {}", path.display()),
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-memory store, used for tests and when persistence is disabled
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.keys().cloned().collect())
    }
}
