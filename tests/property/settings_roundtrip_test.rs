//! Property-based tests for BlogSettings serialization round-trip.
//!
//! These tests verify that BlogSettings can be serialized to JSON
//! and deserialized back without data loss for arbitrary valid inputs.

use blogshelf::types::query::{SortDirection, SortField};
use blogshelf::types::settings::{BlogSettings, DisplaySettings, SourceSettings, StorageSettings};
use proptest::prelude::*;

// --- Arbitrary strategies for all settings sub-types ---

fn arb_sort_field() -> impl Strategy<Value = SortField> {
    proptest::sample::select(SortField::ALL.to_vec())
}

fn arb_sort_direction() -> impl Strategy<Value = SortDirection> {
    prop_oneof![
        Just(SortDirection::Ascending),
        Just(SortDirection::Descending),
    ]
}

fn arb_source_settings() -> impl Strategy<Value = SourceSettings> {
    ("https?://[a-z]{3,12}\\.[a-z]{2,3}/[a-z/]{0,20}\\.json", 1u64..=120u64).prop_map(
        |(dataset_url, timeout_secs)| SourceSettings {
            dataset_url,
            timeout_secs,
        },
    )
}

fn arb_display_settings() -> impl Strategy<Value = DisplaySettings> {
    (
        1usize..=100usize,
        arb_sort_field(),
        arb_sort_direction(),
        20usize..=500usize,
        50u32..=600u32,
    )
        .prop_map(
            |(page_size, default_sort, default_direction, excerpt_length, words_per_minute)| {
                DisplaySettings {
                    page_size,
                    default_sort,
                    default_direction,
                    excerpt_length,
                    words_per_minute,
                }
            },
        )
}

fn arb_storage_settings() -> impl Strategy<Value = StorageSettings> {
    (
        proptest::option::of("/[a-z]{1,10}/[a-z]{1,10}\\.db"),
        "[a-z_]{3,20}",
        "[a-z_]{3,20}",
        "[a-z_]{3,20}",
        "[a-z_]{3,12}_",
        1usize..=1000usize,
    )
        .prop_map(
            |(
                database_path,
                bookmarks_key,
                reading_history_key,
                offline_cache_key,
                liked_key_prefix,
                history_limit,
            )| StorageSettings {
                database_path,
                bookmarks_key,
                reading_history_key,
                offline_cache_key,
                liked_key_prefix,
                history_limit,
            },
        )
}

fn arb_blog_settings() -> impl Strategy<Value = BlogSettings> {
    (
        arb_source_settings(),
        arb_display_settings(),
        arb_storage_settings(),
    )
        .prop_map(|(source, display, storage)| BlogSettings {
            source,
            display,
            storage,
        })
}

// **Property: Settings serialization round-trip**
//
// *For any* valid `BlogSettings` struct, serializing to JSON then
// deserializing SHALL produce an equivalent struct.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn settings_serialization_roundtrip(settings in arb_blog_settings()) {
        let json = serde_json::to_string(&settings)
            .expect("Serialization to JSON should succeed for any valid BlogSettings");

        let deserialized: BlogSettings = serde_json::from_str(&json)
            .expect("Deserialization from JSON should succeed for valid JSON");

        prop_assert_eq!(
            deserialized,
            settings,
            "Deserialized BlogSettings must equal the original"
        );
    }
}
