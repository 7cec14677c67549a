//! App Core for Blogshelf.
//!
//! Builds and owns every manager and service. Components receive their
//! collaborators explicitly; nothing is reachable through globals.

use std::sync::Arc;

use crate::managers::post_manager::{ManagerOptions, PostCollectionManager};
use crate::managers::reading_history_manager::ReadingHistoryManager;
use crate::platform;
use crate::services::fetch_source::FetchSource;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::storage::{SqliteStorage, Storage};
use crate::types::errors::AppError;
use crate::types::query::LoadOutcome;
use crate::types::settings::BlogSettings;

/// Central application struct holding all managers and services.
pub struct App<F: FetchSource> {
    pub settings_engine: SettingsEngine,
    pub storage: Arc<dyn Storage>,
    pub posts: Arc<PostCollectionManager<F>>,
    pub reading_history: ReadingHistoryManager,
}

impl<F: FetchSource> App<F> {
    /// Wires the managers from an already-loaded settings engine.
    pub fn with_components(settings_engine: SettingsEngine, storage: Arc<dyn Storage>, source: F) -> Self {
        let settings = settings_engine.get_settings().clone();
        let posts = Arc::new(PostCollectionManager::new(
            source,
            storage.clone(),
            ManagerOptions::from(&settings),
        ));
        let reading_history = ReadingHistoryManager::new(
            storage.clone(),
            settings.storage.reading_history_key.clone(),
            settings.storage.history_limit,
        );

        Self {
            settings_engine,
            storage,
            posts,
            reading_history,
        }
    }

    pub fn settings(&self) -> &BlogSettings {
        self.settings_engine.get_settings()
    }

    /// Startup sequence: load the post collection.
    pub async fn startup(&self) -> LoadOutcome {
        self.posts.load().await
    }
}

/// Opens the SQLite store named in the settings, or `blogshelf.db` in the data directory.
pub fn open_storage(settings: &BlogSettings) -> Result<Arc<dyn Storage>, AppError> {
    let path = match &settings.storage.database_path {
        Some(path) => path.clone(),
        None => platform::get_data_dir()
            .join("blogshelf.db")
            .to_string_lossy()
            .to_string(),
    };
    tracing::debug!(%path, "opening key-value store");
    Ok(Arc::new(SqliteStorage::open(&path)?))
}

#[cfg(feature = "network")]
impl App<crate::services::fetch_source::HttpFetchSource> {
    /// Loads settings, opens the SQLite store and points the fetch source at the dataset URL.
    pub fn new(config_path: Option<String>) -> Result<Self, AppError> {
        use crate::services::fetch_source::HttpFetchSource;

        let mut settings_engine = SettingsEngine::new(config_path);
        let settings = settings_engine.load()?;
        let storage = open_storage(&settings)?;
        let source = HttpFetchSource::new(
            settings.source.dataset_url.clone(),
            std::time::Duration::from_secs(settings.source.timeout_secs),
        )
        .map_err(|e| AppError::FetchSetup(e.to_string()))?;

        Ok(Self::with_components(settings_engine, storage, source))
    }
}
