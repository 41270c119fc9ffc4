//! Configuration for ShelfPick
//!
//! Configuration is organized into two sections:
//! - Connection settings (port, line speed, timeouts)
//! - Catalog (shelf positions, articles, aliases)
//!
//! Files are JSON or TOML, chosen by extension. Every field has a default, so
//! a partial file only overrides what it names.

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use shelfpick_communication::SessionOptions;
use shelfpick_core::{Catalog, ShelfId, STANDARD_ALIASES, STANDARD_ARTICLES, STANDARD_SHELVES};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name used under the platform config directory
pub const DEFAULT_CONFIG_FILE: &str = "shelfpick.toml";

/// Read/write timeouts must be below this, in milliseconds
pub const MAX_TIMEOUT_MS: u64 = 1000;

/// Connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Port to connect to when none is given
    pub port: Option<String>,
    /// Baud rate (8N1)
    pub baud_rate: u32,
    /// Read/write timeout in milliseconds
    pub timeout_ms: u64,
    /// How long disconnect waits for the reader thread, in milliseconds
    pub reader_join_timeout_ms: u64,
    /// Front-end poll period in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 250_000,
            timeout_ms: 100,
            reader_join_timeout_ms: 1000,
            poll_interval_ms: 80,
        }
    }
}

impl ConnectionSettings {
    /// Session options for these settings
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            baud_rate: self.baud_rate,
            timeout_ms: self.timeout_ms,
            reader_join_timeout_ms: self.reader_join_timeout_ms,
        }
    }
}

/// Shelf position entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfEntry {
    /// Shelf number
    pub id: ShelfId,
    /// Position along the X axis in millimeters
    pub x_mm: f64,
}

/// Article entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleEntry {
    /// Canonical article name
    pub name: String,
    /// Shelf holding the article
    pub shelf: ShelfId,
}

/// Alias entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasEntry {
    /// Alternate spelling
    pub alias: String,
    /// Canonical article name it stands for
    pub article: String,
}

/// Catalog tables
///
/// A `[catalog]` section replaces the built-in tables as a whole; tables it
/// leaves out are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Shelf positions along the axis
    #[serde(default)]
    pub shelves: Vec<ShelfEntry>,
    /// Articles and the shelf each one sits on
    #[serde(default)]
    pub articles: Vec<ArticleEntry>,
    /// Alternate spellings of article names
    #[serde(default)]
    pub aliases: Vec<AliasEntry>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            shelves: STANDARD_SHELVES
                .iter()
                .map(|&(id, x_mm)| ShelfEntry { id, x_mm })
                .collect(),
            articles: STANDARD_ARTICLES
                .iter()
                .map(|&(name, shelf)| ArticleEntry {
                    name: name.to_string(),
                    shelf,
                })
                .collect(),
            aliases: STANDARD_ALIASES
                .iter()
                .map(|&(alias, article)| AliasEntry {
                    alias: alias.to_string(),
                    article: article.to_string(),
                })
                .collect(),
        }
    }
}

impl CatalogSettings {
    /// Build the resolver catalog
    pub fn to_catalog(&self) -> Catalog {
        let mut builder = Catalog::builder();
        for shelf in &self.shelves {
            builder = builder.shelf(shelf.id, shelf.x_mm);
        }
        for article in &self.articles {
            builder = builder.article(article.name.as_str(), article.shelf);
        }
        for alias in &self.aliases {
            builder = builder.alias(&alias.alias, alias.article.as_str());
        }
        builder.build()
    }

    fn validate(&self) -> ConfigResult<()> {
        let mut ids = HashSet::new();
        for shelf in &self.shelves {
            if shelf.id == 0 {
                return Err(ConfigError::ValueOutOfRange {
                    key: "catalog.shelves.id".to_string(),
                    value: "0".to_string(),
                });
            }
            if !ids.insert(shelf.id) {
                return Err(ConfigError::Duplicate {
                    key: "catalog.shelves".to_string(),
                    value: shelf.id.to_string(),
                });
            }
            if !shelf.x_mm.is_finite() || shelf.x_mm < 0.0 {
                return Err(ConfigError::ValueOutOfRange {
                    key: format!("catalog.shelves[{}].x_mm", shelf.id),
                    value: shelf.x_mm.to_string(),
                });
            }
        }

        // Articles on shelves without a position are allowed; resolving one
        // reports the missing position instead.
        let mut names = HashSet::new();
        for article in &self.articles {
            let key = shelfpick_core::normalize_key(&article.name);
            if key.is_empty() {
                return Err(ConfigError::ValueOutOfRange {
                    key: "catalog.articles.name".to_string(),
                    value: format!("{:?}", article.name),
                });
            }
            if !names.insert(key) {
                return Err(ConfigError::Duplicate {
                    key: "catalog.articles".to_string(),
                    value: article.name.clone(),
                });
            }
        }

        let mut aliases = HashSet::new();
        for alias in &self.aliases {
            let key = shelfpick_core::normalize_key(&alias.alias);
            if !aliases.insert(key) {
                return Err(ConfigError::Duplicate {
                    key: "catalog.aliases".to_string(),
                    value: alias.alias.clone(),
                });
            }
            if !names.contains(&shelfpick_core::normalize_key(&alias.article)) {
                tracing::warn!(
                    "Alias '{}' points at unknown article '{}'",
                    alias.alias,
                    alias.article
                );
            }
        }

        Ok(())
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Catalog tables
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a `.json` or `.toml` file
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::LoadError {
            path: path.display().to_string(),
            source,
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Validate and write to a `.json` or `.toml` file
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::from_path(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content).map_err(|source| SettingsError::SaveError {
            path: path.display().to_string(),
            source,
        })?;

        tracing::debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Check value ranges and catalog consistency
    pub fn validate(&self) -> ConfigResult<()> {
        let c = &self.connection;
        let positive = [
            ("connection.baud_rate", u64::from(c.baud_rate)),
            ("connection.timeout_ms", c.timeout_ms),
            ("connection.reader_join_timeout_ms", c.reader_join_timeout_ms),
            ("connection.poll_interval_ms", c.poll_interval_ms),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::ValueOutOfRange {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }

        // A read blocks for up to timeout_ms before the reader sees its stop
        // flag, so the timeout must stay sub-second and below the join wait.
        if c.timeout_ms >= MAX_TIMEOUT_MS || c.timeout_ms >= c.reader_join_timeout_ms {
            return Err(ConfigError::ValueOutOfRange {
                key: "connection.timeout_ms".to_string(),
                value: c.timeout_ms.to_string(),
            });
        }

        self.catalog.validate()
    }

    /// Default location of the configuration file
    pub fn default_path() -> SettingsResult<PathBuf> {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no config or home directory".to_string())
            })?;
        path.push("shelfpick");
        path.push(DEFAULT_CONFIG_FILE);
        Ok(path)
    }

    /// Load `path`, or defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!(
                "No configuration at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }
}
