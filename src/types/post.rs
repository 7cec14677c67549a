use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default reading speed used for `reading_time_minutes`.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// Unique identifier of a post.
///
/// Datasets use either strings or integers; both are kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for PostId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// Post author. Grouping and filtering use `name` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl Author {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: None,
            bio: None,
        }
    }
}

/// A normalized blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub author: Author,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub share_count: u64,
    #[serde(default)]
    pub featured: bool,
    /// Stamped from the bookmark set whenever the post leaves the manager.
    #[serde(default, skip_serializing)]
    pub bookmarked: bool,
    /// Stamped from the liked set whenever the post leaves the manager.
    #[serde(default, skip_serializing)]
    pub liked: bool,
    #[serde(default)]
    pub reading_time_minutes: u32,
}

impl Post {
    /// Recomputes the reading time from `content`, or `excerpt` when there is no content.
    pub fn refresh_derived(&mut self, words_per_minute: u32) {
        let text = self.content.as_deref().unwrap_or(&self.excerpt);
        self.reading_time_minutes = reading_time_minutes(text, words_per_minute);
    }

    /// Replaces the body and keeps the derived reading time in sync.
    pub fn set_content(&mut self, content: Option<String>, words_per_minute: u32) {
        self.content = content;
        self.refresh_derived(words_per_minute);
    }

    /// Replaces the excerpt and keeps the derived reading time in sync.
    pub fn set_excerpt(&mut self, excerpt: impl Into<String>, words_per_minute: u32) {
        self.excerpt = excerpt.into();
        self.refresh_derived(words_per_minute);
    }
}

/// Word count divided by reading speed, rounded up. Empty text reads in zero minutes.
pub fn reading_time_minutes(text: &str, words_per_minute: u32) -> u32 {
    let words = text.split_whitespace().count() as u32;
    let wpm = words_per_minute.max(1);
    words.div_ceil(wpm)
}

/// One distinct facet value and the number of posts carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub value: String,
    pub count: usize,
}

/// Distinct categories, tags and authors of the collection, sorted by value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    pub categories: Vec<FacetCount>,
    pub tags: Vec<FacetCount>,
    pub authors: Vec<FacetCount>,
}
