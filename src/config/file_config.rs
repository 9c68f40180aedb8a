//! Configuration file support.
//!
//! Locates the config file and writes new ones.
//!
//! # Configuration File Format
//!
//! ```toml
//! [sources]
//! max_results = 5
//! timeout_seconds = 15
//! doaj_pdf_pattern = "(?i)pdf"
//!
//! [fallback]
//! enabled = true
//! threshold = 3
//! model = "gemini-2.5-flash"
//!
//! [cache]
//! enabled = true
//! directory = "/var/cache/free-pdf-search"
//!
//! [history]
//! max_entries = 15
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use std::path::{Path, PathBuf};

use super::Config;

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "free-pdf-search.toml";

/// `<config_dir>/free-pdf-search/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(env!("CARGO_PKG_NAME")).join("config.toml"))
}

/// First existing config file: `./free-pdf-search.toml`, then the user config path
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    default_config_path().filter(|p| p.is_file())
}

impl Config {
    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }

    /// Write a default config file, refusing to overwrite unless `force`
    pub fn init(path: &Path, force: bool) -> Result<Self, ConfigFileError> {
        if path.exists() && !force {
            return Err(ConfigFileError::Exists(path.to_path_buf()));
        }
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("{} already exists (use --force to overwrite)", .0.display())]
    Exists(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.fallback.model = "gemini-2.5-pro".to_string();
        config.history.max_entries = 30;
        config.save(&path).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.fallback.model, "gemini-2.5-pro");
        assert_eq!(loaded.history.max_entries, 30);
        assert_eq!(loaded.sources.doaj_pdf_pattern, "(?i)pdf");
    }

    #[test]
    fn test_saved_file_omits_unset_key() {
        let toml = Config::default().to_toml().unwrap();
        assert!(toml.contains("[fallback]"));
        assert!(!toml.contains("api_key"));
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        Config::init(&path, false).unwrap();
        assert!(matches!(
            Config::init(&path, false),
            Err(ConfigFileError::Exists(_))
        ));
        assert!(Config::init(&path, true).is_ok());
    }
}
