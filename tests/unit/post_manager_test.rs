//! Unit tests for the PostCollectionManager: loading with fallback, the
//! single-flight guard, queries over the loaded collection, and engagement
//! state mirrored to storage.

use std::sync::Arc;
use std::time::Duration;

use blogshelf::managers::post_manager::{ManagerOptions, PostCollectionManager};
use blogshelf::services::fetch_source::{StaticFetchSource, StaticResponse};
use blogshelf::services::storage::{MemoryStorage, Storage, StorageExt};
use blogshelf::types::errors::IngestError;
use blogshelf::types::post::{Post, PostId};
use blogshelf::types::query::{
    FilterCriteria, LoadOutcome, LoadSource, PostQuery, SortDirection, SortField,
};

const DATASET: &str = r#"[
    {"id": 1, "title": "Ownership in Practice", "category": "tech", "views": 10, "likes": 0, "date": "2024-01-01", "tags": ["rust"]},
    {"id": 2, "title": "Async Without Tears", "category": "tech", "views": 50, "likes": 3, "date": "2024-01-02", "tags": ["rust", "async"]},
    {"id": 3, "title": "Grids and Gutters", "category": "design", "views": 5, "likes": 1, "date": "2024-01-03"}
]"#;

/// Every record lacks a title or a date.
const ALL_MALFORMED: &str = r#"[{"id": 1}, {"id": 2, "title": "x"}]"#;

type Manager = PostCollectionManager<StaticFetchSource>;

fn manager_with(source: StaticFetchSource, storage: Arc<dyn Storage>) -> Manager {
    PostCollectionManager::new(source, storage, ManagerOptions::default())
}

/// A manager already loaded from `DATASET` over the network path.
async fn loaded_manager() -> (Manager, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let manager = manager_with(StaticFetchSource::body(DATASET), storage.clone());
    let outcome = manager.load().await;
    assert_eq!(outcome.report().map(|r| r.source), Some(LoadSource::Network));
    (manager, storage)
}

fn ids(posts: &[Post]) -> Vec<String> {
    posts.iter().map(|p| p.id.to_string()).collect()
}

fn id(n: u64) -> PostId {
    PostId::from(n)
}

// === Loading ===

#[tokio::test]
async fn test_load_from_network_writes_offline_cache() {
    let (manager, storage) = loaded_manager().await;

    assert_eq!(manager.len(), 3);
    let cached: Option<Vec<Post>> = storage.get_json("offline_posts_cache").unwrap();
    assert_eq!(cached.map(|c| c.len()), Some(3));
    assert_eq!(manager.stats().last_source, Some(LoadSource::Network));
}

#[tokio::test]
async fn test_load_offline_without_cache_uses_sample() {
    let manager = manager_with(StaticFetchSource::offline(), Arc::new(MemoryStorage::new()));

    let outcome = manager.load().await;

    let report = outcome.report().expect("load completes");
    assert_eq!(report.source, LoadSource::Sample);
    assert_eq!(report.loaded, 6);
    assert_eq!(manager.len(), 6);
}

#[tokio::test]
async fn test_load_offline_prefers_cache_over_sample() {
    let (_, storage) = loaded_manager().await;

    let offline = manager_with(StaticFetchSource::offline(), storage);
    let outcome = offline.load().await;

    assert_eq!(outcome.report().map(|r| r.source), Some(LoadSource::Cache));
    assert_eq!(ids(&offline.all()), vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_empty_cache_is_treated_as_missing() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set("offline_posts_cache", "[]").unwrap();

    let manager = manager_with(StaticFetchSource::offline(), storage);
    let outcome = manager.load().await;

    assert_eq!(outcome.report().map(|r| r.source), Some(LoadSource::Sample));
}

#[tokio::test]
async fn test_error_status_falls_back() {
    let manager = manager_with(
        StaticFetchSource::new(StaticResponse::Status(500)),
        Arc::new(MemoryStorage::new()),
    );
    let outcome = manager.load().await;
    assert_eq!(outcome.report().map(|r| r.source), Some(LoadSource::Sample));
}

#[tokio::test]
async fn test_timeout_falls_back() {
    let manager = manager_with(
        StaticFetchSource::new(StaticResponse::Timeout),
        Arc::new(MemoryStorage::new()),
    );
    let outcome = manager.load().await;
    assert_eq!(outcome.report().map(|r| r.source), Some(LoadSource::Sample));
}

#[tokio::test]
async fn test_invalid_body_falls_back_and_keeps_cache() {
    let (_, storage) = loaded_manager().await;

    let manager = manager_with(StaticFetchSource::body("<html>oops</html>"), storage.clone());
    let outcome = manager.load().await;

    assert_eq!(outcome.report().map(|r| r.source), Some(LoadSource::Cache));
    let cached: Option<Vec<Post>> = storage.get_json("offline_posts_cache").unwrap();
    assert_eq!(cached.map(|c| c.len()), Some(3), "a rejected body must not overwrite the cache");
}

#[tokio::test]
async fn test_load_reports_skipped_records() {
    let body = r#"{"posts": [
        {"id": 1, "title": "kept", "date": "2024-01-01"},
        {"id": 1, "title": "duplicate", "date": "2024-01-02"},
        {"id": 2, "date": "2024-01-02"}
    ]}"#;
    let manager = manager_with(StaticFetchSource::body(body), Arc::new(MemoryStorage::new()));

    let outcome = manager.load().await;
    let report = outcome.report().unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(report.skipped_duplicates, 1);
    assert_eq!(report.skipped_malformed, 1);
    assert_eq!(manager.get(&id(1)).unwrap().title, "kept");
}

#[tokio::test]
async fn test_all_malformed_body_falls_back_to_cache() {
    let (_, storage) = loaded_manager().await;

    let manager = manager_with(StaticFetchSource::body(ALL_MALFORMED), storage.clone());
    let outcome = manager.load().await;

    let report = outcome.report().expect("load completes");
    assert_eq!(report.source, LoadSource::Cache);
    assert_eq!(report.skipped_malformed, 2);
    assert_eq!(ids(&manager.all()), vec!["1", "2", "3"]);
    let cached: Option<Vec<Post>> = storage.get_json("offline_posts_cache").unwrap();
    assert_eq!(cached.map(|c| c.len()), Some(3), "the cache is left alone");
}

#[tokio::test]
async fn test_all_malformed_body_without_cache_uses_sample() {
    let storage = Arc::new(MemoryStorage::new());
    let manager = manager_with(StaticFetchSource::body(ALL_MALFORMED), storage.clone());

    let outcome = manager.load().await;

    let report = outcome.report().expect("load completes");
    assert_eq!(report.source, LoadSource::Sample);
    assert_eq!(report.loaded, 6);
    assert_eq!(report.skipped_malformed, 2);
    assert_eq!(storage.get("offline_posts_cache").unwrap(), None);
}

#[tokio::test]
async fn test_concurrent_load_is_rejected() {
    let source = StaticFetchSource::body(DATASET).with_delay(Duration::from_millis(200));
    let manager = Arc::new(manager_with(source, Arc::new(MemoryStorage::new())));

    let first = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.load().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let second = manager.load().await;
    assert_eq!(second, LoadOutcome::AlreadyInFlight);
    assert_eq!(manager.source().calls(), 1, "a rejected load never fetches");

    let first = first.await.unwrap();
    assert_eq!(first.report().map(|r| r.source), Some(LoadSource::Network));
    assert_eq!(manager.len(), 3);

    let third = manager.load().await;
    assert!(matches!(third, LoadOutcome::Completed(_)), "the gate is released after a load");
}

#[tokio::test]
async fn test_cancelled_load_leaves_collection_unchanged() {
    let source = StaticFetchSource::body("[]").with_delay(Duration::from_millis(500));
    let manager = manager_with(source, Arc::new(MemoryStorage::new()));
    manager.replace_posts(DATASET).unwrap();

    let outcome = manager
        .load_until(tokio::time::sleep(Duration::from_millis(10)))
        .await;

    assert_eq!(outcome, LoadOutcome::Cancelled);
    assert_eq!(ids(&manager.all()), vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_replace_posts_rejects_invalid_json() {
    let (manager, _) = loaded_manager().await;

    let result = manager.replace_posts("{ not json");

    assert!(matches!(result, Err(IngestError::InvalidJson(_))));
    assert_eq!(manager.len(), 3);
}

// === Queries ===

#[tokio::test]
async fn test_filter_then_sort_by_views() {
    let (manager, _) = loaded_manager().await;

    let page = manager.query(&PostQuery {
        filter: FilterCriteria::category("tech"),
        sort: Some((SortField::Views, SortDirection::Descending)),
        ..PostQuery::default()
    });

    assert_eq!(ids(&page.posts), vec!["2", "1"]);
}

#[tokio::test]
async fn test_paginate_uses_collection_order() {
    let manager = manager_with(StaticFetchSource::offline(), Arc::new(MemoryStorage::new()));
    manager
        .replace_posts(
            r#"[
            {"id": "a", "title": "A", "date": "2024-01-05"},
            {"id": "b", "title": "B", "date": "2024-01-04"},
            {"id": "c", "title": "C", "date": "2024-01-03"},
            {"id": "d", "title": "D", "date": "2024-01-02"},
            {"id": "e", "title": "E", "date": "2024-01-01"}
        ]"#,
        )
        .unwrap();

    assert_eq!(ids(&manager.paginate(2, 2)), vec!["c", "d"]);
    assert_eq!(ids(&manager.paginate(3, 2)), vec!["e"]);
    assert!(manager.paginate(4, 2).is_empty());
}

#[tokio::test]
async fn test_sort_does_not_reorder_collection() {
    let (manager, _) = loaded_manager().await;

    let sorted = manager.sort(SortField::Views, SortDirection::Ascending);

    assert_eq!(ids(&sorted), vec!["3", "1", "2"]);
    assert_eq!(ids(&manager.all()), vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_search_quantum_ranks_title_match_first() {
    let manager = manager_with(StaticFetchSource::offline(), Arc::new(MemoryStorage::new()));
    manager.load().await;

    let results = manager.search("quantum");

    assert_eq!(
        results[0].title,
        "Quantum Computing: The End of Encryption as We Know It?"
    );
    let body_only = results
        .iter()
        .position(|p| p.title == "The Future of Web Development: Trends to Watch")
        .expect("body mention is still a match");
    assert!(body_only > 0);
}

#[tokio::test]
async fn test_featured_and_facets_from_sample() {
    let manager = manager_with(StaticFetchSource::offline(), Arc::new(MemoryStorage::new()));
    manager.load().await;

    assert_eq!(ids(&manager.featured()), vec!["1"]);
    assert_eq!(manager.facets().categories.len(), 3);
    assert_eq!(manager.popular(1)[0].id, id(2));
    assert_eq!(manager.recent(1)[0].id, id(1));
    assert!(!manager.related(&id(6), 2).is_empty());
}

// === Bookmarks ===

#[tokio::test]
async fn test_toggle_bookmark_twice() {
    let (manager, storage) = loaded_manager().await;
    assert!(manager.bookmark_ids().is_empty());

    assert_eq!(manager.toggle_bookmark(&id(1)), Some(true));
    assert_eq!(manager.bookmark_ids(), vec![id(1)]);
    assert!(manager.get(&id(1)).unwrap().bookmarked);
    let stored: Option<Vec<PostId>> = storage.get_json("bookmarks").unwrap();
    assert_eq!(stored, Some(vec![id(1)]));

    assert_eq!(manager.toggle_bookmark(&id(1)), Some(false));
    assert!(manager.bookmark_ids().is_empty());
    let stored: Option<Vec<PostId>> = storage.get_json("bookmarks").unwrap();
    assert_eq!(stored, Some(vec![]));
}

#[tokio::test]
async fn test_bookmarks_restored_from_storage() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_json("bookmarks", &["2"]).unwrap();

    let manager = manager_with(StaticFetchSource::body(DATASET), storage);
    manager.load().await;

    assert!(manager.get(&id(2)).unwrap().bookmarked);
    assert_eq!(ids(&manager.bookmarked_posts()), vec!["2"]);
    assert_eq!(manager.stats().bookmarks, 1);
}

#[tokio::test]
async fn test_bookmark_on_post_without_id_survives_reload() {
    const BODY: &str = r#"[{"title": "No id here", "date": "2024-01-01"}]"#;
    let storage = Arc::new(MemoryStorage::new());

    let first = manager_with(StaticFetchSource::body(BODY), storage.clone());
    first.load().await;
    let post_id = first.all()[0].id.clone();
    assert_eq!(first.toggle_bookmark(&post_id), Some(true));

    let second = manager_with(StaticFetchSource::body(BODY), storage);
    second.load().await;

    let reloaded = &second.all()[0];
    assert_eq!(reloaded.id, post_id);
    assert!(reloaded.bookmarked);
    assert_eq!(second.toggle_bookmark(&post_id), Some(false));
    assert!(second.bookmark_ids().is_empty());
}

#[test]
fn test_concurrent_toggles_keep_storage_in_step() {
    let records: Vec<serde_json::Value> = (1..=16u64)
        .map(|n| serde_json::json!({"id": n, "title": format!("Post {}", n), "date": "2024-01-01"}))
        .collect();
    let storage = Arc::new(MemoryStorage::new());
    let manager = manager_with(StaticFetchSource::offline(), storage.clone());
    manager
        .replace_posts(&serde_json::Value::Array(records).to_string())
        .unwrap();

    std::thread::scope(|scope| {
        for worker in 0..4u64 {
            let manager = &manager;
            scope.spawn(move || {
                for n in (1..=16u64).filter(|n| n % 4 == worker) {
                    manager.toggle_bookmark(&id(n));
                    manager.toggle_like(&id(n));
                }
            });
        }
    });

    let stored: Vec<PostId> = storage.get_json("bookmarks").unwrap().unwrap();
    assert_eq!(stored.len(), 16);
    assert_eq!(stored, manager.bookmark_ids());
    for n in 1..=16u64 {
        assert_eq!(
            storage.get(&format!("post_liked_{}", n)).unwrap().as_deref(),
            Some("true")
        );
    }
}

#[tokio::test]
async fn test_toggle_bookmark_unknown_id_is_noop() {
    let (manager, storage) = loaded_manager().await;

    assert_eq!(manager.toggle_bookmark(&id(999)), None);
    assert!(manager.bookmark_ids().is_empty());
    assert_eq!(storage.get("bookmarks").unwrap(), None);
}

// === Likes ===

#[tokio::test]
async fn test_toggle_like_updates_count_and_storage() {
    let (manager, storage) = loaded_manager().await;

    assert_eq!(manager.toggle_like(&id(2)), Some(true));
    let post = manager.get(&id(2)).unwrap();
    assert!(post.liked);
    assert_eq!(post.like_count, 4);
    assert_eq!(storage.get("post_liked_2").unwrap().as_deref(), Some("true"));

    assert_eq!(manager.toggle_like(&id(2)), Some(false));
    let post = manager.get(&id(2)).unwrap();
    assert!(!post.liked);
    assert_eq!(post.like_count, 3);
    assert_eq!(storage.get("post_liked_2").unwrap(), None);
}

#[tokio::test]
async fn test_unlike_never_goes_below_zero() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set("post_liked_1", "true").unwrap();
    let manager = manager_with(StaticFetchSource::body(DATASET), storage);
    manager.load().await;

    let post = manager.get(&id(1)).unwrap();
    assert!(post.liked, "liked flag restored from storage");
    assert_eq!(post.like_count, 0);

    assert_eq!(manager.toggle_like(&id(1)), Some(false));
    assert_eq!(manager.get(&id(1)).unwrap().like_count, 0);
}

#[tokio::test]
async fn test_toggle_like_unknown_id_is_noop() {
    let (manager, _) = loaded_manager().await;
    assert_eq!(manager.toggle_like(&id(42)), None);
    assert_eq!(manager.stats().likes, 0);
}

// === Counters ===

#[tokio::test]
async fn test_record_view_and_share() {
    let (manager, _) = loaded_manager().await;

    assert!(manager.record_view(&id(3)));
    assert!(manager.record_view(&id(3)));
    assert!(manager.record_share(&id(3)));

    let post = manager.get(&id(3)).unwrap();
    assert_eq!(post.view_count, 7);
    assert_eq!(post.share_count, 1);
}

#[tokio::test]
async fn test_record_view_unknown_id_changes_nothing() {
    let (manager, _) = loaded_manager().await;
    let before: Vec<u64> = manager.all().iter().map(|p| p.view_count).collect();

    assert!(!manager.record_view(&id(999)));

    let after: Vec<u64> = manager.all().iter().map(|p| p.view_count).collect();
    assert_eq!(before, after);
}

// === Storage failures ===

#[tokio::test]
async fn test_storage_failure_keeps_memory_state() {
    let (manager, storage) = loaded_manager().await;
    storage.set_available(false);

    assert_eq!(manager.toggle_bookmark(&id(1)), Some(true));
    assert_eq!(manager.toggle_like(&id(1)), Some(true));

    assert!(manager.get(&id(1)).unwrap().bookmarked);
    assert!(manager.get(&id(1)).unwrap().liked);
    assert_eq!(manager.stats().storage_failures, 2);
}

#[tokio::test]
async fn test_load_survives_quota_exceeded_cache_write() {
    let storage = Arc::new(MemoryStorage::with_quota(64));
    let manager = manager_with(StaticFetchSource::body(DATASET), storage.clone());

    let outcome = manager.load().await;

    assert_eq!(outcome.report().map(|r| r.source), Some(LoadSource::Network));
    assert_eq!(manager.len(), 3);
    assert_eq!(manager.stats().storage_failures, 1);
    assert_eq!(storage.get("offline_posts_cache").unwrap(), None);
}
