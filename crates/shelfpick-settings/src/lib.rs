//! ShelfPick Settings Crate
//!
//! Handles application configuration: connection settings and the
//! article catalog, persisted as TOML or JSON.

pub mod config;
pub mod error;

pub use config::{
    AliasEntry, ArticleEntry, CatalogSettings, Config, ConnectionSettings, ShelfEntry,
    DEFAULT_CONFIG_FILE, MAX_TIMEOUT_MS,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
