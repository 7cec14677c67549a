use serde::{Deserialize, Serialize};

use super::post::DEFAULT_WORDS_PER_MINUTE;
use super::query::{SortDirection, SortField};

/// Top-level settings container, persisted as `settings.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BlogSettings {
    pub source: SourceSettings,
    pub display: DisplaySettings,
    pub storage: StorageSettings,
}

/// Where the post dataset comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceSettings {
    pub dataset_url: String,
    pub timeout_secs: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            dataset_url: "http://localhost:8080/data/posts.json".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Listing and normalization defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplaySettings {
    pub page_size: usize,
    pub default_sort: SortField,
    pub default_direction: SortDirection,
    /// Characters kept when an excerpt is derived from content.
    pub excerpt_length: usize,
    pub words_per_minute: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            page_size: 6,
            default_sort: SortField::Date,
            default_direction: SortDirection::Descending,
            excerpt_length: 160,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

/// Persistence location and key names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// SQLite file backing the key-value store. `None` uses the platform data directory.
    pub database_path: Option<String>,
    pub bookmarks_key: String,
    pub reading_history_key: String,
    pub offline_cache_key: String,
    pub liked_key_prefix: String,
    pub history_limit: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            bookmarks_key: "bookmarks".to_string(),
            reading_history_key: "reading_history".to_string(),
            offline_cache_key: "offline_posts_cache".to_string(),
            liked_key_prefix: "post_liked_".to_string(),
            history_limit: 100,
        }
    }
}
