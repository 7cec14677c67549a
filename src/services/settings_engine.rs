// Blogshelf settings engine. The settings name the dataset URL and the
// listing defaults, plus the storage keys that hold reader state.
// Persisted as pretty-printed JSON in the platform config directory.

use std::fs;
use std::path::Path;

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::BlogSettings;

/// Access to the [`BlogSettings`] that `App` wires into the post manager,
/// the reading history and the storage backend.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<BlogSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &BlogSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// File-backed settings. Every successful update is written straight back so
/// the next start sees the same page size, sort and storage keys.
pub struct SettingsEngine {
    config_path: String,
    settings: BlogSettings,
}

impl SettingsEngine {
    /// Engine holding defaults until [`load`](SettingsEngineTrait::load) runs.
    ///
    /// `path_override` points at a specific file, as the binary's first
    /// argument does. Without it the file is `blogshelf/settings.json` under
    /// the platform config dir.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = match path_override {
            Some(p) => p,
            None => platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .to_string(),
        };

        Self {
            config_path,
            settings: BlogSettings::default(),
        }
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Reads the settings file. A first run with no file gets the defaults
    /// (six posts per page, newest first); a corrupt file is
    /// reported rather than silently replaced.
    fn load(&mut self) -> Result<BlogSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            tracing::debug!(path = %self.config_path, "no settings file, using defaults");
            self.settings = BlogSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: BlogSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Writes the settings file, creating the config directory on first save.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &BlogSettings {
        &self.settings
    }

    /// Changes one setting addressed by section and field, then saves.
    ///
    /// Paths look like `"display.page_size"` or `"source.dataset_url"`. The edited
    /// tree must still deserialize as `BlogSettings`, so a string page size or
    /// an unknown sort field is refused and nothing changes.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }
        let parts: Vec<&str> = key.split('.').collect();

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        let (last, parents) = parts
            .split_last()
            .ok_or_else(|| SettingsError::InvalidKey(key.to_string()))?;
        let mut current = &mut json_value;
        for part in parents {
            current = current.get_mut(*part).ok_or_else(|| {
                SettingsError::InvalidKey(format!("Key '{}' not found in settings", key))
            })?;
        }
        match current {
            serde_json::Value::Object(map) if map.contains_key(*last) => {
                map.insert(last.to_string(), value);
            }
            serde_json::Value::Object(_) => {
                return Err(SettingsError::InvalidKey(format!(
                    "Key '{}' not found in settings",
                    key
                )));
            }
            _ => {
                return Err(SettingsError::InvalidKey(format!(
                    "Cannot navigate to key '{}': intermediate value is not an object",
                    key
                )));
            }
        }

        let new_settings: BlogSettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;

        self.settings = new_settings;
        self.save()
    }

    /// Restores the defaults and overwrites the settings file.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = BlogSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
