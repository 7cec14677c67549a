//! Integration-level unit tests for the SettingsEngine public API.
//!
//! These tests exercise the SettingsEngine through its public trait interface:
//! default loading, value persistence, reset behavior and malformed files.

use blogshelf::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use blogshelf::types::errors::SettingsError;
use blogshelf::types::query::{SortDirection, SortField};
use blogshelf::types::settings::BlogSettings;
use tempfile::TempDir;

/// Helper: create a SettingsEngine backed by a temp directory that lives for the
/// duration of the test (the caller holds the `TempDir` handle).
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    let path = dir
        .path()
        .join("settings.json")
        .to_string_lossy()
        .to_string();
    SettingsEngine::new(Some(path))
}

/// Without a config file `load()` returns the built-in defaults.
#[test]
fn test_load_defaults_when_no_config_file_exists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let settings = engine.load().unwrap();

    assert_eq!(
        settings,
        BlogSettings::default(),
        "Loading without a config file must return default settings"
    );
    assert_eq!(settings.display.page_size, 6);
    assert_eq!(settings.storage.bookmarks_key, "bookmarks");
    assert_eq!(settings.storage.offline_cache_key, "offline_posts_cache");
}

/// A change made through `set_value` is visible to a fresh engine on the same file.
#[test]
fn test_set_value_persists_changes() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine
            .set_value(
                "source.dataset_url",
                serde_json::Value::String("https://blog.example.com/posts.json".to_string()),
            )
            .unwrap();
        engine
            .set_value("display.default_direction", serde_json::json!("ascending"))
            .unwrap();
    }

    {
        let mut engine2 = engine_in_temp(&dir);
        let loaded = engine2.load().unwrap();
        assert_eq!(
            loaded.source.dataset_url, "https://blog.example.com/posts.json",
            "set_value must persist the change so a new engine instance reads it back"
        );
        assert_eq!(loaded.display.default_direction, SortDirection::Ascending);
    }
}

#[test]
fn test_set_value_unknown_key_rejected() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let result = engine.set_value("display.font_size", serde_json::json!(14));
    assert!(matches!(result, Err(SettingsError::InvalidKey(_))));

    let result = engine.set_value("", serde_json::json!(14));
    assert!(matches!(result, Err(SettingsError::InvalidKey(_))));

    assert!(
        !std::path::Path::new(engine.get_config_path()).exists(),
        "rejected updates must not write the file"
    );
}

/// After modifying settings, `reset()` restores and persists the defaults.
#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();

        engine
            .set_value("display.default_sort", serde_json::json!("likes"))
            .unwrap();
        engine
            .set_value("storage.history_limit", serde_json::json!(20))
            .unwrap();

        assert_eq!(engine.get_settings().display.default_sort, SortField::Likes);
        assert_eq!(engine.get_settings().storage.history_limit, 20);

        engine.reset().unwrap();

        assert_eq!(
            *engine.get_settings(),
            BlogSettings::default(),
            "In-memory settings must equal defaults after reset"
        );
    }

    {
        let mut engine2 = engine_in_temp(&dir);
        let loaded = engine2.load().unwrap();
        assert_eq!(
            loaded,
            BlogSettings::default(),
            "Reset must persist defaults to disk so a new engine reads them back"
        );
    }
}

#[test]
fn test_load_malformed_file_is_serialization_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("settings.json"), "{ \"display\": ").unwrap();

    let mut engine = engine_in_temp(&dir);
    let result = engine.load();
    assert!(matches!(result, Err(SettingsError::SerializationError(_))));
}
