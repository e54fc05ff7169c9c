use crate::post::Post;
use serde::Serialize;

/// Longer queries are cut to this many characters before matching.
pub const MAX_QUERY_LEN: usize = 200;
pub const DEFAULT_PER_PAGE: usize = 9;

/// One 1-based page of a larger listing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

pub fn normalize_query(query: &str) -> String {
    query
        .trim()
        .chars()
        .take(MAX_QUERY_LEN)
        .collect::<String>()
        .to_lowercase()
}

/// Case-insensitive substring match against title, description and tags.
/// A blank query matches every post.
pub fn search_posts<'a>(posts: &'a [Post], query: &str) -> Vec<&'a Post> {
    let query = normalize_query(query);
    if query.is_empty() {
        return posts.iter().collect();
    }
    posts
        .iter()
        .filter(|post| {
            post.title.to_lowercase().contains(&query)
                || post.description.to_lowercase().contains(&query)
                || post.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
        })
        .collect()
}

/// Pages start at 1; page 0 is treated as the first page and a page past the
/// end is empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let start = (page - 1).saturating_mul(per_page);
    let slice = items
        .get(start..)
        .map(|rest| &rest[..rest.len().min(per_page)])
        .unwrap_or(&[]);

    Page {
        items: slice.to_vec(),
        page,
        total_pages: items.len().div_ceil(per_page),
        total_items: items.len(),
    }
}
