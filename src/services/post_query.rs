//! Pure listing operations over post sequences: filter, sort, search, paginate,
//! facets and discovery helpers.
//!
//! Nothing here touches storage or shared state; the collection manager calls
//! these with a snapshot of its posts.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, HashSet};

use crate::types::post::{FacetCount, Facets, Post, PostId};
use crate::types::query::{FilterCriteria, PostPage, PostQuery, SortDirection, SortField};

/// Posts satisfying every predicate in `criteria`, in input order.
pub fn filter_posts(posts: &[Post], criteria: &FilterCriteria) -> Vec<Post> {
    posts
        .iter()
        .filter(|post| criteria.matches(post))
        .cloned()
        .collect()
}

/// Stable in-place sort. Ties keep their input order in both directions.
pub fn sort_posts(posts: &mut [Post], field: SortField, direction: SortDirection) {
    posts.sort_by(|a, b| {
        let ord = compare_by(a, b, field);
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

/// Natural ordering of two posts on one field. Text compares case-insensitively.
pub fn compare_by(a: &Post, b: &Post, field: SortField) -> Ordering {
    match field {
        SortField::Date => a.published_at.cmp(&b.published_at),
        SortField::Title => cmp_ignore_case(&a.title, &b.title),
        SortField::Author => cmp_ignore_case(&a.author.name, &b.author.name),
        SortField::Category => cmp_ignore_case(&a.category, &b.category),
        SortField::ReadingTime => a.reading_time_minutes.cmp(&b.reading_time_minutes),
        SortField::Views => a.view_count.cmp(&b.view_count),
        SortField::Likes => a.like_count.cmp(&b.like_count),
    }
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// The 1-indexed `page` of `items`. Page 0, size 0 or a page past the end is empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = match (page - 1).checked_mul(page_size) {
        Some(start) if start < items.len() => start,
        _ => return &[],
    };
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `total` items.
pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

/// How well a post matches a search term. Lower ranks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRank {
    Title,
    Body,
}

/// Rank of `post` for an already lower-cased, non-empty needle; `None` if it does not match.
pub fn match_rank(post: &Post, needle: &str) -> Option<MatchRank> {
    let contains = |haystack: &str| haystack.to_lowercase().contains(needle);

    if contains(&post.title) {
        return Some(MatchRank::Title);
    }
    let in_body = contains(&post.excerpt)
        || post.content.as_deref().is_some_and(contains)
        || post.tags.iter().any(|tag| contains(tag))
        || contains(&post.author.name);
    in_body.then_some(MatchRank::Body)
}

/// Case-insensitive substring search across title, excerpt, content, tags and author.
///
/// Title matches come first, then by views descending; remaining ties keep input
/// order. A blank query returns every post unchanged.
pub fn search_posts(posts: &[Post], query: &str) -> Vec<Post> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return posts.to_vec();
    }

    let mut ranked: Vec<(MatchRank, &Post)> = posts
        .iter()
        .filter_map(|post| match_rank(post, &needle).map(|rank| (rank, post)))
        .collect();
    ranked.sort_by_key(|(rank, post)| (*rank, Reverse(post.view_count)));
    ranked.into_iter().map(|(_, post)| post.clone()).collect()
}

/// Search, filter, sort and paginate in one pass.
///
/// Without an explicit sort a search keeps relevance order and a plain listing
/// falls back to `default_sort`.
pub fn run_query(
    posts: &[Post],
    query: &PostQuery,
    default_sort: (SortField, SortDirection),
) -> PostPage {
    let searching = query
        .search
        .as_deref()
        .is_some_and(|q| !q.trim().is_empty());

    let mut matched = match query.search.as_deref() {
        Some(q) if searching => search_posts(posts, q),
        _ => posts.to_vec(),
    };
    matched.retain(|post| query.filter.matches(post));

    match query.sort {
        Some((field, direction)) => sort_posts(&mut matched, field, direction),
        None if !searching => sort_posts(&mut matched, default_sort.0, default_sort.1),
        None => {}
    }

    let total = matched.len();
    PostPage {
        posts: paginate(&matched, query.page, query.page_size).to_vec(),
        page: query.page,
        page_size: query.page_size,
        total,
        total_pages: total_pages(total, query.page_size),
    }
}

/// Distinct categories, tags and authors with post counts, sorted by value.
pub fn facets(posts: &[Post]) -> Facets {
    let mut categories: BTreeMap<&str, usize> = BTreeMap::new();
    let mut tags: BTreeMap<&str, usize> = BTreeMap::new();
    let mut authors: BTreeMap<&str, usize> = BTreeMap::new();

    for post in posts {
        *categories.entry(post.category.as_str()).or_default() += 1;
        *authors.entry(post.author.name.as_str()).or_default() += 1;
        for tag in &post.tags {
            *tags.entry(tag.as_str()).or_default() += 1;
        }
    }

    Facets {
        categories: into_counts(categories),
        tags: into_counts(tags),
        authors: into_counts(authors),
    }
}

fn into_counts(map: BTreeMap<&str, usize>) -> Vec<FacetCount> {
    map.into_iter()
        .map(|(value, count)| FacetCount {
            value: value.to_string(),
            count,
        })
        .collect()
}

/// Most viewed posts first.
pub fn popular_posts(posts: &[Post], limit: usize) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    sort_posts(&mut sorted, SortField::Views, SortDirection::Descending);
    sorted.truncate(limit);
    sorted
}

/// Newest posts first.
pub fn recent_posts(posts: &[Post], limit: usize) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    sort_posts(&mut sorted, SortField::Date, SortDirection::Descending);
    sorted.truncate(limit);
    sorted
}

/// Posts sharing tags (2 points each) or the category (1 point) with `target`,
/// best score first, newer first on equal scores.
pub fn related_posts(posts: &[Post], target: &PostId, limit: usize) -> Vec<Post> {
    let Some(source) = posts.iter().find(|p| &p.id == target) else {
        return Vec::new();
    };
    let source_tags: HashSet<&str> = source.tags.iter().map(String::as_str).collect();

    let mut scored: Vec<(usize, &Post)> = posts
        .iter()
        .filter(|p| &p.id != target)
        .map(|p| {
            let shared = p
                .tags
                .iter()
                .filter(|t| source_tags.contains(t.as_str()))
                .count();
            let same_category = usize::from(p.category == source.category);
            (shared * 2 + same_category, p)
        })
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| b.published_at.cmp(&a.published_at)));
    scored.into_iter().take(limit).map(|(_, p)| p.clone()).collect()
}
