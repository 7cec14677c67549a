//! Key-value storage for Blogshelf.
//!
//! [`Storage`] stands in for browser local storage: string keys, string values,
//! `get`/`set`/`remove`. Two backends are provided: [`MemoryStorage`], which can
//! emulate a byte quota and a disabled store, and [`SqliteStorage`], backed by the
//! `kv_store` table of a [`Database`].

use std::collections::HashMap;
use std::sync::Mutex;

use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::Database;
use crate::types::errors::StorageError;

/// Capability for persisting small string values by key.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// JSON helpers available on every [`Storage`], including trait objects.
pub trait StorageExt: Storage {
    /// Reads and decodes a JSON value. A missing key yields `Ok(None)`.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::SerializationError(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    /// Encodes a value as JSON and stores it.
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StorageError::SerializationError(format!("{}: {}", key, e)))?;
        self.set(key, &raw)
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}

// === MemoryStorage ===

#[derive(Default)]
struct MemoryState {
    entries: HashMap<String, String>,
    quota: Option<usize>,
    unavailable: bool,
}

impl MemoryState {
    fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

/// In-process storage. Quota accounting counts key and value bytes, like browser storage.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes once keys plus values would exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        let storage = Self::default();
        storage.lock().quota = Some(bytes);
        storage
    }

    /// Turns every operation into [`StorageError::Unavailable`] while `false`.
    pub fn set_available(&self, available: bool) {
        self.lock().unavailable = !available;
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned map is still a valid map.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let state = self.lock();
        if state.unavailable {
            return Err(StorageError::Unavailable("storage disabled".to_string()));
        }
        Ok(state.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(StorageError::Unavailable("storage disabled".to_string()));
        }
        if let Some(quota) = state.quota {
            let existing = state.entries.get(key).map_or(0, |v| key.len() + v.len());
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(state.used_bytes() - existing);
            if needed > available {
                return Err(StorageError::QuotaExceeded { needed, available });
            }
        }
        state.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(StorageError::Unavailable("storage disabled".to_string()));
        }
        state.entries.remove(key);
        Ok(())
    }
}

// === SqliteStorage ===

/// Storage persisted in the `kv_store` table.
pub struct SqliteStorage {
    db: Mutex<Database>,
}

impl SqliteStorage {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Opens (or creates) the database file and wraps it.
    pub fn open(path: &str) -> Result<Self, StorageError> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Keys ordered by most recent write first.
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        let db = self.lock()?;
        let mut stmt = db
            .connection()
            .prepare("SELECT key FROM kv_store ORDER BY updated_at DESC, key")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Database>, StorageError> {
        self.db
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let db = self.lock()?;
        let value = db
            .connection()
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = chrono::Utc::now().timestamp_millis();
        let db = self.lock()?;
        db.connection().execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let db = self.lock()?;
        db.connection()
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}
