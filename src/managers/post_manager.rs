//! Post Collection Manager for Blogshelf.
//!
//! Owns the canonical in-memory list of posts, answers filter/sort/search/
//! paginate queries against it, and keeps bookmarks, liked flags and the offline
//! copy of the dataset in the injected [`Storage`].
//!
//! Every method takes `&self`, so one manager can be shared behind an `Arc`.
//! Only [`load`](PostCollectionManager::load) performs I/O; at most one load runs
//! at a time and a second caller is turned away rather than queued.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::services::fetch_source::FetchSource;
use crate::services::normalizer::{normalize_all, parse_dataset, NormalizeOptions, NormalizedBatch};
use crate::services::post_query;
use crate::services::sample_data::sample_posts;
use crate::services::storage::{Storage, StorageExt};
use crate::types::errors::{IngestError, StorageError};
use crate::types::post::{Facets, Post, PostId};
use crate::types::query::{
    CollectionStats, FilterCriteria, LoadOutcome, LoadReport, LoadSource, PostPage, PostQuery,
    SortDirection, SortField,
};
use crate::types::settings::BlogSettings;

/// Storage key names used by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub bookmarks: String,
    pub offline_cache: String,
    pub liked_prefix: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            bookmarks: "bookmarks".to_string(),
            offline_cache: "offline_posts_cache".to_string(),
            liked_prefix: "post_liked_".to_string(),
        }
    }
}

/// Construction-time configuration of a [`PostCollectionManager`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagerOptions {
    pub normalize: NormalizeOptions,
    pub keys: StorageKeys,
    pub default_sort: (SortField, SortDirection),
}

impl From<&BlogSettings> for ManagerOptions {
    fn from(settings: &BlogSettings) -> Self {
        Self {
            normalize: NormalizeOptions {
                words_per_minute: settings.display.words_per_minute,
                excerpt_length: settings.display.excerpt_length,
            },
            keys: StorageKeys {
                bookmarks: settings.storage.bookmarks_key.clone(),
                offline_cache: settings.storage.offline_cache_key.clone(),
                liked_prefix: settings.storage.liked_key_prefix.clone(),
            },
            default_sort: (
                settings.display.default_sort,
                settings.display.default_direction,
            ),
        }
    }
}

#[derive(Default)]
struct CollectionState {
    posts: Vec<Post>,
    index: HashMap<PostId, usize>,
    bookmarks: BTreeSet<PostId>,
    liked: HashSet<PostId>,
    last_source: Option<LoadSource>,
}

impl CollectionState {
    /// Copy of `post` with the derived flags filled in from the sets.
    fn stamped(&self, post: &Post) -> Post {
        let mut post = post.clone();
        post.bookmarked = self.bookmarks.contains(&post.id);
        post.liked = self.liked.contains(&post.id);
        post
    }

    fn snapshot(&self) -> Vec<Post> {
        self.posts.iter().map(|p| self.stamped(p)).collect()
    }

    fn post_mut(&mut self, id: &PostId) -> Option<&mut Post> {
        let idx = *self.index.get(id)?;
        self.posts.get_mut(idx)
    }
}

/// In-memory post collection with storage-backed user state.
pub struct PostCollectionManager<F: FetchSource> {
    source: F,
    storage: Arc<dyn Storage>,
    options: ManagerOptions,
    state: RwLock<CollectionState>,
    load_gate: tokio::sync::Mutex<()>,
    storage_failures: AtomicU64,
}

impl<F: FetchSource> PostCollectionManager<F> {
    /// Creates an empty manager and restores the bookmark set from storage.
    pub fn new(source: F, storage: Arc<dyn Storage>, options: ManagerOptions) -> Self {
        let manager = Self {
            source,
            storage,
            options,
            state: RwLock::new(CollectionState::default()),
            load_gate: tokio::sync::Mutex::new(()),
            storage_failures: AtomicU64::new(0),
        };
        let bookmarks = manager.restore_bookmarks();
        manager.write().bookmarks = bookmarks;
        manager
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    // ─── Ingestion ───

    /// Fetches, normalizes and installs the dataset.
    ///
    /// Falls back to the offline cache, then to the embedded sample posts. Never
    /// fails; a call made while another load is running returns
    /// [`LoadOutcome::AlreadyInFlight`] without waiting.
    pub async fn load(&self) -> LoadOutcome {
        self.load_until(std::future::pending::<()>()).await
    }

    /// Like [`load`](Self::load), but abandons the fetch once `cancel` resolves.
    ///
    /// A cancelled load leaves the current collection untouched.
    pub async fn load_until<C>(&self, cancel: C) -> LoadOutcome
    where
        C: Future<Output = ()>,
    {
        let Ok(_guard) = self.load_gate.try_lock() else {
            info!("load already in flight, ignoring request");
            return LoadOutcome::AlreadyInFlight;
        };

        let fetched = tokio::select! {
            biased;
            _ = cancel => {
                info!("load cancelled before the dataset arrived");
                return LoadOutcome::Cancelled;
            }
            result = self.source.fetch() => result,
        };

        let batch = match fetched {
            Ok(body) => self.parse_body(&body).map_err(|err| {
                warn!(%err, "dataset rejected, falling back");
                match err {
                    IngestError::AllMalformed(rejected) => rejected,
                    _ => 0,
                }
            }),
            Err(err) => {
                warn!(%err, "dataset fetch failed, falling back");
                Err(0)
            }
        };

        let report = match batch {
            Ok(batch) => self.install_network_batch(batch),
            Err(rejected) => self.install_fallback(rejected),
        };
        info!(
            source = ?report.source,
            loaded = report.loaded,
            skipped_malformed = report.skipped_malformed,
            skipped_duplicates = report.skipped_duplicates,
            "post collection loaded"
        );
        LoadOutcome::Completed(report)
    }

    /// Installs an already-fetched dataset body without any fallback.
    ///
    /// On success the normalized posts are also written to the offline cache.
    pub fn replace_posts(&self, body: &str) -> Result<LoadReport, IngestError> {
        let batch = self.parse_body(body)?;
        Ok(self.install_network_batch(batch))
    }

    fn parse_body(&self, body: &str) -> Result<NormalizedBatch, IngestError> {
        let records = parse_dataset(body)?;
        normalize_all(&records, self.options.normalize)
    }

    fn install_network_batch(&self, batch: NormalizedBatch) -> LoadReport {
        self.persist(
            "offline cache",
            self.storage
                .set_json(&self.options.keys.offline_cache, &batch.posts),
        );
        let (loaded, duplicates) = self.install(batch.posts, LoadSource::Network);
        LoadReport {
            source: LoadSource::Network,
            loaded,
            skipped_malformed: batch.skipped_malformed,
            skipped_duplicates: batch.skipped_duplicates + duplicates,
        }
    }

    /// `rejected` is the number of malformed records in the body that forced the fallback.
    fn install_fallback(&self, rejected: usize) -> LoadReport {
        let cached = match self
            .storage
            .get_json::<Vec<Post>>(&self.options.keys.offline_cache)
        {
            Ok(Some(posts)) if !posts.is_empty() => Some(posts),
            Ok(_) => None,
            Err(err) => {
                warn!(%err, "offline cache unreadable");
                None
            }
        };

        let (posts, source) = match cached {
            Some(posts) => (posts, LoadSource::Cache),
            None => (sample_posts(self.options.normalize), LoadSource::Sample),
        };
        let (loaded, duplicates) = self.install(posts, source);
        LoadReport {
            source,
            loaded,
            skipped_malformed: rejected,
            skipped_duplicates: duplicates,
        }
    }

    /// Swaps in a new collection. Returns (installed, dropped duplicate ids).
    fn install(&self, posts: Vec<Post>, source: LoadSource) -> (usize, usize) {
        let mut index = HashMap::with_capacity(posts.len());
        let mut unique = Vec::with_capacity(posts.len());
        let mut duplicates = 0;
        for mut post in posts {
            if index.contains_key(&post.id) {
                duplicates += 1;
                continue;
            }
            post.bookmarked = false;
            post.liked = false;
            index.insert(post.id.clone(), unique.len());
            unique.push(post);
        }

        let liked: HashSet<PostId> = unique
            .iter()
            .filter(|post| self.stored_like(&post.id))
            .map(|post| post.id.clone())
            .collect();

        let loaded = unique.len();
        let mut state = self.write();
        state.posts = unique;
        state.index = index;
        state.liked = liked;
        state.last_source = Some(source);
        (loaded, duplicates)
    }

    fn restore_bookmarks(&self) -> BTreeSet<PostId> {
        match self
            .storage
            .get_json::<Vec<PostId>>(&self.options.keys.bookmarks)
        {
            Ok(Some(ids)) => ids.into_iter().collect(),
            Ok(None) => BTreeSet::new(),
            Err(err) => {
                warn!(%err, "stored bookmarks unreadable, starting empty");
                BTreeSet::new()
            }
        }
    }

    fn stored_like(&self, id: &PostId) -> bool {
        match self.storage.get(&self.liked_key(id)) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(err) => {
                debug!(%err, %id, "liked flag unreadable");
                false
            }
        }
    }

    fn liked_key(&self, id: &PostId) -> String {
        format!("{}{}", self.options.keys.liked_prefix, id)
    }

    // ─── Queries ───

    /// Every post in collection order.
    pub fn all(&self) -> Vec<Post> {
        self.read().snapshot()
    }

    pub fn get(&self, id: &PostId) -> Option<Post> {
        let state = self.read();
        let idx = *state.index.get(id)?;
        state.posts.get(idx).map(|p| state.stamped(p))
    }

    pub fn len(&self) -> usize {
        self.read().posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Posts matching every supplied predicate, in collection order.
    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<Post> {
        post_query::filter_posts(&self.all(), criteria)
    }

    /// The whole collection, stably sorted. The canonical order is not changed.
    pub fn sort(&self, field: SortField, direction: SortDirection) -> Vec<Post> {
        let mut posts = self.all();
        post_query::sort_posts(&mut posts, field, direction);
        posts
    }

    /// A 1-indexed page of the collection in collection order.
    pub fn paginate(&self, page: usize, page_size: usize) -> Vec<Post> {
        let state = self.read();
        post_query::paginate(&state.posts, page, page_size)
            .iter()
            .map(|p| state.stamped(p))
            .collect()
    }

    /// Relevance-ranked substring search; a blank query returns everything.
    pub fn search(&self, query: &str) -> Vec<Post> {
        post_query::search_posts(&self.all(), query)
    }

    /// Search, filter, sort and paginate in one call.
    pub fn query(&self, query: &PostQuery) -> PostPage {
        post_query::run_query(&self.all(), query, self.options.default_sort)
    }

    pub fn facets(&self) -> Facets {
        post_query::facets(&self.read().posts)
    }

    pub fn popular(&self, limit: usize) -> Vec<Post> {
        post_query::popular_posts(&self.all(), limit)
    }

    pub fn recent(&self, limit: usize) -> Vec<Post> {
        post_query::recent_posts(&self.all(), limit)
    }

    pub fn related(&self, id: &PostId, limit: usize) -> Vec<Post> {
        post_query::related_posts(&self.all(), id, limit)
    }

    pub fn featured(&self) -> Vec<Post> {
        self.filter(&FilterCriteria {
            featured_only: true,
            ..FilterCriteria::default()
        })
    }

    pub fn bookmarked_posts(&self) -> Vec<Post> {
        self.filter(&FilterCriteria {
            bookmarked_only: true,
            ..FilterCriteria::default()
        })
    }

    /// Bookmarked ids, including ones not present in the current collection.
    pub fn bookmark_ids(&self) -> Vec<PostId> {
        self.read().bookmarks.iter().cloned().collect()
    }

    pub fn stats(&self) -> CollectionStats {
        let state = self.read();
        CollectionStats {
            posts: state.posts.len(),
            bookmarks: state.bookmarks.len(),
            likes: state.liked.len(),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
            last_source: state.last_source,
        }
    }

    // ─── Mutations ───

    /// Flips the bookmark on `id` and persists the set. Returns the new state.
    ///
    /// The set is written while the state lock is held, so concurrent toggles
    /// reach storage in the same order they changed memory. Unknown ids are
    /// ignored and yield `None`.
    pub fn toggle_bookmark(&self, id: &PostId) -> Option<bool> {
        let mut state = self.write();
        if !state.index.contains_key(id) {
            debug!(%id, "bookmark toggle for unknown post ignored");
            return None;
        }
        let bookmarked = if state.bookmarks.remove(id) {
            false
        } else {
            state.bookmarks.insert(id.clone());
            true
        };

        let ids: Vec<&PostId> = state.bookmarks.iter().collect();
        self.persist(
            "bookmarks",
            self.storage.set_json(&self.options.keys.bookmarks, &ids),
        );
        Some(bookmarked)
    }

    /// Flips the like on `id`, adjusting `like_count` without going below zero.
    ///
    /// Unknown ids are ignored and yield `None`.
    pub fn toggle_like(&self, id: &PostId) -> Option<bool> {
        let mut state = self.write();
        let liked = !state.liked.contains(id);
        let post = match state.post_mut(id) {
            Some(post) => post,
            None => {
                debug!(%id, "like toggle for unknown post ignored");
                return None;
            }
        };
        post.like_count = if liked {
            post.like_count.saturating_add(1)
        } else {
            post.like_count.saturating_sub(1)
        };
        if liked {
            state.liked.insert(id.clone());
        } else {
            state.liked.remove(id);
        }

        // Written under the lock, like the bookmark set.
        let key = self.liked_key(id);
        let result = if liked {
            self.storage.set(&key, "true")
        } else {
            self.storage.remove(&key)
        };
        self.persist("liked flag", result);
        Some(liked)
    }

    /// Counts a view. Returns `false`, changing nothing, for unknown ids.
    pub fn record_view(&self, id: &PostId) -> bool {
        self.bump(id, |post| post.view_count = post.view_count.saturating_add(1))
    }

    /// Counts a share. Returns `false`, changing nothing, for unknown ids.
    pub fn record_share(&self, id: &PostId) -> bool {
        self.bump(id, |post| post.share_count = post.share_count.saturating_add(1))
    }

    fn bump(&self, id: &PostId, apply: impl FnOnce(&mut Post)) -> bool {
        match self.write().post_mut(id) {
            Some(post) => {
                apply(post);
                true
            }
            None => {
                debug!(%id, "counter update for unknown post ignored");
                false
            }
        }
    }

    // ─── Internals ───

    fn persist(&self, what: &str, result: Result<(), StorageError>) {
        if let Err(err) = result {
            self.storage_failures.fetch_add(1, Ordering::Relaxed);
            warn!(%err, what, "storage write skipped");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CollectionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CollectionState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
