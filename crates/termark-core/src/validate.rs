//! Prefix allow-lists for link targets and image sources.
//!
//! Both predicates normalize once (trim, lower-case) and run the deny-list and
//! the allow-list against that same form, so mixed-case schemes cannot slip
//! past one check and into the other.

const DANGEROUS_SCHEMES: [&str; 5] = ["javascript:", "data:", "vbscript:", "file:", "about:"];

const URL_PREFIXES: [&str; 5] = ["http://", "https://", "mailto:", "/", "#"];

const IMAGE_PREFIXES: [&str; 3] = ["http://", "https://", "/"];

/// Returns `true` when `url` may be used as an anchor `href`.
pub fn is_safe_url(url: &str) -> bool {
    is_allowed(url, &URL_PREFIXES)
}

/// Returns `true` when `path` may be used as an image `src`.
pub fn is_safe_image_path(path: &str) -> bool {
    is_allowed(path, &IMAGE_PREFIXES)
}

fn is_allowed(candidate: &str, allowed: &[&str]) -> bool {
    let normalized = candidate.trim().to_lowercase();
    if DANGEROUS_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
    {
        return false;
    }
    allowed.iter().any(|prefix| normalized.starts_with(prefix))
}
