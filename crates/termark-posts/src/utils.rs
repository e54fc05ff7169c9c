//! Presentation helpers shared by post listings and post pages.

use crate::post::Post;

const WORDS_PER_MINUTE: usize = 200;
const FALLBACK_ICON: &str = "fa-solid fa-file-code";

/// How many related posts a post page shows.
pub const RELATED_LIMIT: usize = 2;

/// Zero-pads the month and day of a `YYYY-M-D` date. Anything that is not
/// three numeric components comes back unchanged.
pub fn format_date(date: &str) -> String {
    let parts: Vec<&str> = date.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return date.to_string();
    };
    match (year.parse::<i32>(), month.parse::<u32>(), day.parse::<u32>()) {
        (Ok(year), Ok(month), Ok(day)) => format!("{}-{:02}-{:02}", year, month, day),
        _ => date.to_string(),
    }
}

/// Minutes to read `content`, never less than one.
pub fn estimate_read_time(content: &str) -> usize {
    content
        .split_whitespace()
        .count()
        .div_ceil(WORDS_PER_MINUTE)
        .max(1)
}

/// Expands a short icon name from frontmatter to full Font Awesome classes.
pub fn icon_class(icon: &str) -> &'static str {
    match icon {
        "fa-file-code" => "fa-solid fa-file-code",
        "fa-shield" => "fa-solid fa-shield",
        "fa-shield-alt" => "fa-solid fa-shield-halved",
        "fa-bug" => "fa-solid fa-bug",
        "fa-gavel" => "fa-solid fa-gavel",
        "fa-code-branch" => "fa-solid fa-code-branch",
        "fa-network-wired" => "fa-solid fa-network-wired",
        "fa-cloud-arrow-up" => "fa-solid fa-cloud-arrow-up",
        "fa-user-secret" => "fa-solid fa-user-secret",
        _ => FALLBACK_ICON,
    }
}

fn position(posts: &[Post], slug: &str) -> Option<usize> {
    posts.iter().position(|post| post.slug == slug)
}

/// The newer neighbour of `slug` in a newest-first listing.
pub fn previous_post<'a>(posts: &'a [Post], slug: &str) -> Option<&'a Post> {
    let index = position(posts, slug)?;
    index.checked_sub(1).and_then(|prev| posts.get(prev))
}

/// The older neighbour of `slug` in a newest-first listing.
pub fn next_post<'a>(posts: &'a [Post], slug: &str) -> Option<&'a Post> {
    let index = position(posts, slug)?;
    posts.get(index + 1)
}

/// Up to `limit` posts sharing a tag with `slug`, topped up with the most
/// recent remaining posts. Unknown slugs have no related posts.
pub fn related_posts<'a>(posts: &'a [Post], slug: &str, limit: usize) -> Vec<&'a Post> {
    let Some(current) = posts.iter().find(|post| post.slug == slug) else {
        return Vec::new();
    };

    let mut related: Vec<&Post> = posts
        .iter()
        .filter(|post| post.slug != slug && post.tags.iter().any(|tag| current.tags.contains(tag)))
        .take(limit)
        .collect();

    if related.len() < limit {
        let missing = limit - related.len();
        let fill: Vec<&Post> = posts
            .iter()
            .filter(|post| post.slug != slug && !related.iter().any(|r| r.slug == post.slug))
            .take(missing)
            .collect();
        related.extend(fill);
    }
    related
}
