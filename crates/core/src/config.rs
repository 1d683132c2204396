//! Journal configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (TOML)
//! 3. Environment variables (JOURNAL_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::JournalError;
use crate::images::data_uri::DEFAULT_MAX_IMAGE_BYTES;
use crate::models::filter::{EntryFilter, SortKey};
use crate::services::validation::FormVariant;
use crate::storage::store::DEFAULT_STORAGE_KEY;

/// Environment variable prefix
const ENV_PREFIX: &str = "JOURNAL";

/// Journal configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Directory holding the backing store files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Key the entry collection is stored under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Largest accepted image attachment, in bytes
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    /// Simple journal form or full trade form
    #[serde(default)]
    pub form_variant: FormVariant,

    /// Filter preset applied on startup (e.g. "all", "profit", "30d")
    #[serde(default = "default_filter")]
    pub default_filter: String,

    /// Sort applied on startup (e.g. "date_desc", "amount_asc")
    #[serde(default = "default_sort")]
    pub default_sort: String,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_key: default_storage_key(),
            max_image_bytes: default_max_image_bytes(),
            form_variant: FormVariant::default(),
            default_filter: default_filter(),
            default_sort: default_sort(),
        }
    }
}

impl JournalConfig {
    /// Load configuration from a specific path.
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self, JournalError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                JournalError::Config(format!("Failed to read config file {}: {e}", path.display()))
            })?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (no environment overrides).
    pub fn load_from_str(toml_content: &str) -> Result<Self, JournalError> {
        let config: JournalConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Default config file location (`<config dir>/trading-journal/config.toml`),
    /// overridable with `JOURNAL_CONFIG`.
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{ENV_PREFIX}_CONFIG")) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trading-journal")
            .join("config.toml")
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var(format!("{ENV_PREFIX}_DATA_DIR")) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(key) = std::env::var(format!("{ENV_PREFIX}_STORAGE_KEY")) {
            self.storage_key = key;
        }
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), JournalError> {
        if self.storage_key.trim().is_empty() {
            return Err(JournalError::Config("storage_key must not be empty".into()));
        }
        if self.max_image_bytes == 0 {
            return Err(JournalError::Config("max_image_bytes must be positive".into()));
        }
        self.filter()?;
        self.sort()?;
        Ok(())
    }

    /// Parsed startup filter.
    pub fn filter(&self) -> Result<EntryFilter, JournalError> {
        self.default_filter.parse().map_err(JournalError::Config)
    }

    /// Parsed startup sort.
    pub fn sort(&self) -> Result<SortKey, JournalError> {
        self.default_sort.parse().map_err(JournalError::Config)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trading-journal")
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_max_image_bytes() -> usize {
    DEFAULT_MAX_IMAGE_BYTES
}

fn default_filter() -> String {
    "all".to_string()
}

fn default_sort() -> String {
    "date_desc".to_string()
}
