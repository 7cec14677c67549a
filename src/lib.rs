//! Blogshelf: the post collection core of a static blog.
//!
//! Loads posts from a JSON dataset (with offline-cache and sample fallbacks),
//! answers filter/sort/search/paginate queries, and keeps bookmarks, likes,
//! views and reading history in an injected key-value store.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod services;
pub mod types;
