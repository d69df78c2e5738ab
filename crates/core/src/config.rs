//! Application configuration.
//!
//! Values are layered: built-in defaults, then the optional
//! `<config_dir>/gametrack/config.toml`, then `GAMETRACK_*` environment
//! variables using `__` between nested keys (`GAMETRACK_RAWG__API_KEY`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::paginate::{DEFAULT_CATALOG_PAGE_SIZE, DEFAULT_LIST_PAGE_SIZE};

const APP_DIR: &str = "gametrack";
const CONFIG_FILE: &str = "config.toml";
const LIBRARY_FILE: &str = "library.json";
const ENV_PREFIX: &str = "GAMETRACK";

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# gametrack configuration
#
# Every key is optional; environment variables such as
# GAMETRACK_RAWG__API_KEY override the values below.

# data_dir = "/path/to/gametrack/data"
# username = "player"

[browse]
catalog_page_size = 18
list_page_size = 9

[rawg]
base_url = "https://api.rawg.io/api/games"
# Leave empty to skip catalog ingestion.
api_key = ""
pages = 5
page_size = 40
"#;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the library file and logs.
    pub data_dir: PathBuf,
    /// Owner of list entries created from this process.
    pub username: String,
    /// Page sizes for the browse screens.
    pub browse: BrowseConfig,
    /// Catalog provider settings.
    pub rawg: RawgConfig,
}

/// Page sizes used when browsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseConfig {
    /// Games per catalog page.
    pub catalog_page_size: usize,
    /// Entries per list page.
    pub list_page_size: usize,
}

/// RAWG provider settings used by catalog ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawgConfig {
    /// Listing endpoint; detail lookups append `/{slug}`.
    pub base_url: String,
    /// Static API key sent as the `key` query parameter.
    pub api_key: String,
    /// Number of listing pages requested per ingestion run.
    pub pages: u32,
    /// Items requested per listing page.
    pub page_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            username: default_username(),
            browse: BrowseConfig::default(),
            rawg: RawgConfig::default(),
        }
    }
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            catalog_page_size: DEFAULT_CATALOG_PAGE_SIZE,
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
        }
    }
}

impl Default for RawgConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.rawg.io/api/games".to_string(),
            api_key: String::new(),
            pages: 5,
            page_size: 40,
        }
    }
}

impl RawgConfig {
    /// Ingestion runs only with a non-blank API key.
    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl AppConfig {
    /// Load configuration from the default file location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load configuration from `path` (if it exists) and the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Location of the JSON library file.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(LIBRARY_FILE)
    }

    /// Directory receiving log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Path of the user configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Write a commented configuration template when none exists yet.
pub fn ensure_default_config() -> Result<()> {
    ensure_config_at(&config_path())
}

fn ensure_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(())
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_username() -> String {
    std::env::var("USER")
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "player".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
username = "ana"
data_dir = "/tmp/gametrack-test"

[browse]
list_page_size = 3

[rawg]
pages = 2
"#,
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.username, "ana");
        assert_eq!(config.store_path(), PathBuf::from("/tmp/gametrack-test/library.json"));
        assert_eq!(config.browse.list_page_size, 3);
        assert_eq!(config.browse.catalog_page_size, DEFAULT_CATALOG_PAGE_SIZE);
        assert_eq!(config.rawg.pages, 2);
        assert_eq!(config.rawg.page_size, 40);
        Ok(())
    }

    #[test]
    fn written_template_parses_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.toml");
        ensure_config_at(&path)?;
        assert!(path.exists());

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.browse, BrowseConfig::default());
        assert_eq!(config.rawg.base_url, RawgConfig::default().base_url);
        assert!(!RawgConfig::default().is_enabled());

        // An existing file is left alone.
        fs::write(&path, "username = \"ben\"\n")?;
        ensure_config_at(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "username = \"ben\"\n");
        Ok(())
    }
}
