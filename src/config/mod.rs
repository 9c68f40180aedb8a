//! Configuration management.
//!
//! Settings come from an optional TOML file overlaid with environment
//! variables prefixed `FREE_PDF_SEARCH`, nested with `__`
//! (e.g. `FREE_PDF_SEARCH_FALLBACK__MODEL`). Every field has a default.

mod file_config;

pub use file_config::{default_config_path, find_config_file, ConfigFileError, CONFIG_FILE_NAME};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::{ARXIV_API_URL, DEFAULT_MAX_RESULTS, DEFAULT_MODEL, DOAJ_API_URL, GEMINI_API_URL, OPENLIBRARY_URL};
use crate::utils::DEFAULT_HISTORY_LIMIT;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "FREE_PDF_SEARCH";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub fallback: FallbackConfig,
    pub cache: CacheConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

/// Provider endpoints and request limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Items requested from each provider
    pub max_results: usize,

    /// Per-source timeout, also used as the HTTP request timeout
    pub timeout_seconds: u64,

    pub arxiv_url: String,
    pub doaj_url: String,
    pub openlibrary_url: String,

    /// Regex a DOAJ full-text link must match; empty accepts every link
    pub doaj_pdf_pattern: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            timeout_seconds: 15,
            arxiv_url: ARXIV_API_URL.to_string(),
            doaj_url: DOAJ_API_URL.to_string(),
            openlibrary_url: OPENLIBRARY_URL.to_string(),
            doaj_pdf_pattern: "(?i)pdf".to_string(),
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

/// AI fallback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub enabled: bool,

    /// The fallback runs when the primary sources return fewer records
    pub threshold: usize,

    pub model: String,
    pub api_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 3,
            model: DEFAULT_MODEL.to_string(),
            api_url: GEMINI_API_URL.to_string(),
            api_key: None,
        }
    }
}

impl FallbackConfig {
    /// Configured key, else `GEMINI_API_KEY` / `GOOGLE_API_KEY`
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(crate::sources::api_key_from_env)
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
        }
    }
}

impl CacheConfig {
    /// Configured directory, else the platform cache directory
    ///
    /// A leading `~` in the configured directory is the home directory.
    pub fn resolved_directory(&self) -> PathBuf {
        match &self.directory {
            Some(dir) => expand_home(dir),
            None => default_data_dir(),
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,

    /// `json` selects the JSON formatter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

/// Directory holding the persisted store
pub fn default_data_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(env!("CARGO_PKG_NAME"))
}

/// Load configuration from a file plus environment overrides
///
/// An explicit `path` must exist. Without one the default locations are
/// tried, and a missing file just means defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();

    match path {
        Some(path) => {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        None => {
            if let Some(found) = find_config_file() {
                tracing::debug!("Using config file {}", found.display());
                builder = builder.add_source(config::File::from(found.as_path()).required(false));
            }
        }
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sources.max_results, 5);
        assert_eq!(config.sources.timeout(), Duration::from_secs(15));
        assert_eq!(config.fallback.threshold, 3);
        assert_eq!(config.fallback.model, "gemini-2.5-flash");
        assert_eq!(config.history.max_entries, 15);
        assert!(config.cache.enabled);
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[sources]
max_results = 10
doaj_pdf_pattern = ""

[fallback]
enabled = false
threshold = 1

[cache]
directory = "/tmp/pdf-cache"

[logging]
format = "json"
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.sources.max_results, 10);
        assert_eq!(config.sources.doaj_pdf_pattern, "");
        // Untouched fields keep their defaults
        assert_eq!(config.sources.timeout_seconds, 15);
        assert_eq!(config.sources.arxiv_url, ARXIV_API_URL);
        assert!(!config.fallback.enabled);
        assert_eq!(config.fallback.threshold, 1);
        assert_eq!(
            config.cache.resolved_directory(),
            PathBuf::from("/tmp/pdf-cache")
        );
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_cache_directory_expands_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };

        let cache = CacheConfig {
            enabled: true,
            directory: Some(PathBuf::from("~/.cache/free-pdf-search")),
        };
        assert_eq!(cache.resolved_directory(), home.join(".cache/free-pdf-search"));

        let cache = CacheConfig {
            enabled: true,
            directory: Some(PathBuf::from("/srv/~cache")),
        };
        assert_eq!(cache.resolved_directory(), PathBuf::from("/srv/~cache"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sources]\nmax_results = \"many\"\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_configured_api_key_wins() {
        let fallback = FallbackConfig {
            api_key: Some("from-config".into()),
            ..FallbackConfig::default()
        };
        assert_eq!(fallback.resolved_api_key().as_deref(), Some("from-config"));
    }
}
