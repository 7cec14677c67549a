//! Reading History Manager for Blogshelf.
//!
//! Tracks per-post read status and progress, most recent first, persisted as a
//! JSON array under a single storage key.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::services::storage::{Storage, StorageExt};
use crate::types::post::PostId;
use crate::types::reading::{ReadingHistoryEntry, ReadingStatus};

/// Trait defining reading history operations.
pub trait ReadingHistoryManagerTrait {
    fn record_progress(&self, post_id: &PostId, progress: u8) -> ReadingHistoryEntry;
    fn mark_completed(&self, post_id: &PostId) -> ReadingHistoryEntry;
    fn status(&self, post_id: &PostId) -> ReadingStatus;
    fn entries(&self) -> Vec<ReadingHistoryEntry>;
    fn remove(&self, post_id: &PostId) -> bool;
    fn clear(&self);
}

/// Reading history kept in memory and mirrored to [`Storage`].
pub struct ReadingHistoryManager {
    storage: Arc<dyn Storage>,
    key: String,
    limit: usize,
    entries: Mutex<Vec<ReadingHistoryEntry>>,
}

impl ReadingHistoryManager {
    /// Loads existing history from `key`. Unreadable history starts empty.
    pub fn new(storage: Arc<dyn Storage>, key: impl Into<String>, limit: usize) -> Self {
        let key = key.into();
        let mut entries = match storage.get_json::<Vec<ReadingHistoryEntry>>(&key) {
            Ok(Some(entries)) => entries,
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(%err, "stored reading history unreadable, starting empty");
                Vec::new()
            }
        };
        entries.truncate(limit);

        Self {
            storage,
            key,
            limit,
            entries: Mutex::new(entries),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ReadingHistoryEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save(&self, entries: &[ReadingHistoryEntry]) {
        if let Err(err) = self.storage.set_json(&self.key, entries) {
            warn!(%err, "reading history not persisted");
        }
    }

    fn upsert(&self, post_id: &PostId, progress: u8) -> ReadingHistoryEntry {
        let progress = progress.min(100);
        let entry = ReadingHistoryEntry {
            post_id: post_id.clone(),
            status: ReadingStatus::from_progress(progress),
            progress,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };

        let snapshot = {
            let mut entries = self.lock();
            entries.retain(|e| &e.post_id != post_id);
            entries.insert(0, entry.clone());
            entries.truncate(self.limit);
            entries.clone()
        };
        self.save(&snapshot);
        entry
    }
}

impl ReadingHistoryManagerTrait for ReadingHistoryManager {
    /// Records how far the reader got. Progress is clamped to 100.
    fn record_progress(&self, post_id: &PostId, progress: u8) -> ReadingHistoryEntry {
        self.upsert(post_id, progress)
    }

    fn mark_completed(&self, post_id: &PostId) -> ReadingHistoryEntry {
        self.upsert(post_id, 100)
    }

    /// Status of a post; posts never opened are `Unread`.
    fn status(&self, post_id: &PostId) -> ReadingStatus {
        self.lock()
            .iter()
            .find(|e| &e.post_id == post_id)
            .map(|e| e.status)
            .unwrap_or_default()
    }

    /// History entries, most recently updated first.
    fn entries(&self) -> Vec<ReadingHistoryEntry> {
        self.lock().clone()
    }

    fn remove(&self, post_id: &PostId) -> bool {
        let snapshot = {
            let mut entries = self.lock();
            let before = entries.len();
            entries.retain(|e| &e.post_id != post_id);
            if entries.len() == before {
                return false;
            }
            entries.clone()
        };
        self.save(&snapshot);
        true
    }

    fn clear(&self) {
        self.lock().clear();
        if let Err(err) = self.storage.remove(&self.key) {
            warn!(%err, "reading history not cleared in storage");
        }
    }
}
