//! Raw dataset records to [`Post`] values.
//!
//! Datasets come from hand-written JSON files, so field names vary: `date` or
//! `publishedAt`, `views` or `viewCount`, `author` as a string or an object.
//! Normalization tolerates these variants, derives the excerpt and reading time,
//! and derives a stable id when the record has none.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::types::errors::{IngestError, NormalizeError};
use crate::types::post::{Author, Post, PostId, DEFAULT_WORDS_PER_MINUTE};

const DEFAULT_AUTHOR: &str = "Anonymous";
const DEFAULT_CATEGORY: &str = "uncategorized";

/// Knobs for derived fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub words_per_minute: u32,
    pub excerpt_length: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            excerpt_length: 160,
        }
    }
}

/// Posts that survived normalization plus the rejection counts.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub posts: Vec<Post>,
    pub skipped_malformed: usize,
    pub skipped_duplicates: usize,
}

/// Splits a dataset body into raw records. Accepts a bare array or a `{"posts": [...]}` envelope.
pub fn parse_dataset(body: &str) -> Result<Vec<Value>, IngestError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| IngestError::InvalidJson(e.to_string()))?;
    match value {
        Value::Array(records) => Ok(records),
        Value::Object(mut envelope) => match envelope.remove("posts") {
            Some(Value::Array(records)) => Ok(records),
            Some(other) => Err(IngestError::UnexpectedShape(format!(
                "`posts` is {}",
                json_kind(&other)
            ))),
            None => Err(IngestError::UnexpectedShape(
                "object without a `posts` array".to_string(),
            )),
        },
        other => Err(IngestError::UnexpectedShape(json_kind(&other).to_string())),
    }
}

/// Normalizes every record, dropping malformed ones and later duplicates of an id.
///
/// Fails with [`IngestError::AllMalformed`] when records exist but none is usable.
pub fn normalize_all(
    records: &[Value],
    options: NormalizeOptions,
) -> Result<NormalizedBatch, IngestError> {
    let mut batch = NormalizedBatch::default();
    let mut seen: HashSet<PostId> = HashSet::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        match normalize_post(record, options) {
            Ok(post) => {
                if seen.insert(post.id.clone()) {
                    batch.posts.push(post);
                } else {
                    tracing::debug!(index, id = %post.id, "skipping duplicate post id");
                    batch.skipped_duplicates += 1;
                }
            }
            Err(reason) => {
                tracing::debug!(index, %reason, "skipping malformed post record");
                batch.skipped_malformed += 1;
            }
        }
    }

    if !records.is_empty() && batch.posts.is_empty() && batch.skipped_malformed > 0 {
        return Err(IngestError::AllMalformed(batch.skipped_malformed));
    }
    Ok(batch)
}

/// Turns one raw record into a [`Post`].
pub fn normalize_post(record: &Value, options: NormalizeOptions) -> Result<Post, NormalizeError> {
    let obj = record.as_object().ok_or(NormalizeError::NotAnObject)?;

    let title = text_field(obj, &["title"])
        .filter(|t| !t.is_empty())
        .ok_or(NormalizeError::MissingTitle)?;

    let raw_date = first_field(obj, &["publishedAt", "published_at", "date"])
        .ok_or(NormalizeError::MissingDate)?;
    let published_at = parse_timestamp(raw_date)?;

    let id = first_field(obj, &["id"])
        .and_then(id_from_value)
        .unwrap_or_else(|| derived_id(&title, &published_at));

    let content = text_field(obj, &["content", "body"]).filter(|c| !c.is_empty());
    let excerpt = match text_field(obj, &["excerpt", "summary"]).filter(|e| !e.is_empty()) {
        Some(excerpt) => excerpt,
        None => derive_excerpt(content.as_deref().unwrap_or(""), options.excerpt_length),
    };

    let mut post = Post {
        id,
        title,
        excerpt,
        content,
        author: author_from(first_field(obj, &["author"])),
        category: text_field(obj, &["category"])
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        tags: tags_from(first_field(obj, &["tags"])),
        published_at,
        view_count: counter(obj, &["viewCount", "views"]),
        like_count: counter(obj, &["likeCount", "likes"]),
        comment_count: counter(obj, &["commentCount", "comments"]),
        share_count: counter(obj, &["shareCount", "shares"]),
        featured: obj.get("featured").and_then(Value::as_bool).unwrap_or(false),
        bookmarked: false,
        liked: false,
        reading_time_minutes: 0,
    };
    post.refresh_derived(options.words_per_minute);
    Ok(post)
}

/// Collapses whitespace and cuts to `max_chars`, preferring a word boundary.
pub fn derive_excerpt(content: &str, max_chars: usize) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let cut: String = collapsed.chars().take(max_chars).collect();
    let trimmed = match cut.rfind(' ') {
        Some(pos) if pos > 0 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}...", trimmed.trim_end())
}

/// Parses RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, NormalizeError> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| NormalizeError::InvalidDate(n.to_string())),
        other => Err(NormalizeError::InvalidDate(other.to_string())),
    }
}

fn parse_date_str(s: &str) -> Result<DateTime<Utc>, NormalizeError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(NormalizeError::InvalidDate(s.to_string()))
}

fn first_field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|v| !v.is_null())
}

fn text_field(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    first_field(obj, names)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
}

fn id_from_value(value: &Value) -> Option<PostId> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(PostId::new(s.trim())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(PostId::new(i.to_string()))
            } else {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| PostId::new(format!("{}", f as i64)))
            }
        }
        _ => None,
    }
}

/// Name-based uuid over title and publish time, so reloads of the same record
/// keep the id that bookmarks and likes are stored under.
fn derived_id(title: &str, published_at: &DateTime<Utc>) -> PostId {
    let name = format!("{}\n{}", title, published_at.to_rfc3339());
    PostId::new(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string())
}

fn author_from(value: Option<&Value>) -> Author {
    let author = match value {
        Some(Value::String(name)) => Author::named(name.trim()),
        Some(Value::Object(obj)) => Author {
            name: text_field(obj, &["name"]).unwrap_or_default(),
            avatar: text_field(obj, &["avatar"]).filter(|s| !s.is_empty()),
            bio: text_field(obj, &["bio"]).filter(|s| !s.is_empty()),
        },
        _ => Author::named(DEFAULT_AUTHOR),
    };
    if author.name.is_empty() {
        Author {
            name: DEFAULT_AUTHOR.to_string(),
            ..author
        }
    } else {
        author
    }
}

fn tags_from(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(joined)) => joined.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

fn counter(obj: &Map<String, Value>, names: &[&str]) -> u64 {
    match first_field(obj, names) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
