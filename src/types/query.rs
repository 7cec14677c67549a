use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::post::Post;

/// Inclusive bounds on `published_at`. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| *at >= from) && self.to.map_or(true, |to| *at <= to)
    }
}

/// Optional predicates combined by conjunction. `Default` matches every post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub author: Option<String>,
    pub date_range: Option<DateRange>,
    pub max_reading_time: Option<u32>,
    #[serde(default)]
    pub bookmarked_only: bool,
    #[serde(default)]
    pub featured_only: bool,
}

impl FilterCriteria {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn author(author: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        if let Some(category) = &self.category {
            if &post.category != category {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !post.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(author) = &self.author {
            if &post.author.name != author {
                return false;
            }
        }
        if let Some(range) = &self.date_range {
            if !range.contains(&post.published_at) {
                return false;
            }
        }
        if let Some(max) = self.max_reading_time {
            if post.reading_time_minutes > max {
                return false;
            }
        }
        if self.bookmarked_only && !post.bookmarked {
            return false;
        }
        if self.featured_only && !post.featured {
            return false;
        }
        true
    }
}

/// Field a post sequence can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Date,
    Title,
    Author,
    Category,
    ReadingTime,
    Views,
    Likes,
}

impl SortField {
    pub const ALL: [SortField; 7] = [
        SortField::Date,
        SortField::Title,
        SortField::Author,
        SortField::Category,
        SortField::ReadingTime,
        SortField::Views,
        SortField::Likes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::Title => "title",
            SortField::Author => "author",
            SortField::Category => "category",
            SortField::ReadingTime => "readingTime",
            SortField::Views => "views",
            SortField::Likes => "likes",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown sort field: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!("Unknown sort direction: {}", other)),
        }
    }
}

/// A complete listing request: search, then filter, then sort, then paginate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub filter: FilterCriteria,
    /// `None` keeps relevance order for searches and falls back to newest-first otherwise.
    pub sort: Option<(SortField, SortDirection)>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            search: None,
            filter: FilterCriteria::default(),
            sort: None,
            page: 1,
            page_size: 10,
        }
    }
}

/// One page of a listing plus the totals a pager needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl PostPage {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1 && self.page <= self.total_pages
    }
}

/// Where the current collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadSource {
    Network,
    Cache,
    Sample,
}

/// Summary of one completed `load()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub source: LoadSource,
    pub loaded: usize,
    pub skipped_malformed: usize,
    pub skipped_duplicates: usize,
}

/// Result of a `load()` call. Loading never fails outward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Completed(LoadReport),
    /// Another load was already running; nothing changed.
    AlreadyInFlight,
    /// The cancellation future resolved first; nothing changed.
    Cancelled,
}

impl LoadOutcome {
    pub fn report(&self) -> Option<&LoadReport> {
        match self {
            LoadOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Counters describing the manager's current state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub posts: usize,
    pub bookmarks: usize,
    pub likes: usize,
    pub storage_failures: u64,
    pub last_source: Option<LoadSource>,
}
