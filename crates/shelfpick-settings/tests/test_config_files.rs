//! Config file load/save through real files

use shelfpick_settings::{ArticleEntry, Config, ConfigError, SettingsError, ShelfEntry};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_toml_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shelfpick.toml");

    let mut config = Config::default();
    config.connection.port = Some("/dev/ttyACM0".to_string());
    config.catalog.shelves.push(ShelfEntry { id: 8, x_mm: 2500.5 });
    config.catalog.articles.push(ArticleEntry {
        name: "M12x40".to_string(),
        shelf: 8,
    });
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(
        loaded.catalog.to_catalog().resolve("m12X40").unwrap().x_mm,
        2500.5
    );
}

#[test]
fn test_json_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shelfpick.json");

    let config = Config::default();
    config.save_to_file(&path).unwrap();
    assert_eq!(Config::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.toml");
    fs::write(
        &path,
        "[connection]\nport = \"COM3\"\nbaud_rate = 115200\n",
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.connection.port.as_deref(), Some("COM3"));
    assert_eq!(config.connection.baud_rate, 115_200);
    assert_eq!(config.connection.timeout_ms, 100);
    assert_eq!(config.catalog, Config::default().catalog);
}

#[test]
fn test_custom_catalog_replaces_standard() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.toml");
    fs::write(
        &path,
        r#"
[[catalog.shelves]]
id = 1
x_mm = 25.0

[[catalog.articles]]
name = "Washer M8"
shelf = 1

[[catalog.aliases]]
alias = "U8"
article = "Washer M8"
"#,
    )
    .unwrap();

    let catalog = Config::load_from_file(&path).unwrap().catalog.to_catalog();
    assert_eq!(catalog.resolve("u8").unwrap().article, "Washer M8");
    assert!(catalog.resolve("M6x30").is_err());
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[connection]\ntimeout_ms = 0\n").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(
        err,
        SettingsError::Config(ConfigError::ValueOutOfRange { .. })
    ));
}

#[test]
fn test_malformed_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[connection\nport = ").unwrap();
    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::TomlError(_))
    ));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shelfpick.yaml");
    assert!(matches!(
        Config::default().save_to_file(&path),
        Err(SettingsError::Config(ConfigError::UnsupportedFormat(_)))
    ));
    assert!(!path.exists());
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::LoadError { .. })
    ));
    assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
}
