use crate::error::PostError;
use gray_matter::engine::YAML;
use gray_matter::{Matter, Pod};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

pub const DEFAULT_ICON: &str = "fa-file-code";

/// A published post: frontmatter metadata plus the markdown body.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Post {
    pub slug: String,
    pub title: String,
    /// `YYYY-MM-DD`, compared as a string when ordering posts.
    pub date: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Short Font Awesome name, see [`crate::utils::icon_class`].
    pub icon: String,
    pub content: String,
}

/// Every field is read leniently: null or a mismatched YAML type falls back to
/// the default instead of rejecting the post.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct Frontmatter {
    #[serde(deserialize_with = "lenient_string")]
    title: String,
    #[serde(deserialize_with = "lenient_string")]
    date: String,
    #[serde(deserialize_with = "lenient_string")]
    description: String,
    #[serde(deserialize_with = "lenient_tags")]
    tags: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    icon: String,
}

impl Default for Frontmatter {
    fn default() -> Self {
        Self {
            title: String::new(),
            date: String::new(),
            description: String::new(),
            tags: Vec::new(),
            icon: DEFAULT_ICON.to_string(),
        }
    }
}

/// Scalars render as text; null, lists and maps become empty.
fn scalar_text(pod: Pod) -> Option<String> {
    match pod {
        Pod::String(text) => Some(text),
        Pod::Integer(value) => Some(value.to_string()),
        Pod::Float(value) => Some(value.to_string()),
        Pod::Boolean(value) => Some(value.to_string()),
        Pod::Null | Pod::Array(_) | Pod::Hash(_) => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(<Pod as Deserialize>::deserialize(deserializer)?).unwrap_or_default())
}

/// A list keeps its scalar entries; a lone scalar becomes a single tag.
fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match <Pod as Deserialize>::deserialize(deserializer)? {
        Pod::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    })
}

/// Splits `source` into YAML frontmatter and body. A file without a
/// frontmatter block gets every default.
pub fn parse_post(slug: &str, path: &Path, source: &str) -> Result<Post, PostError> {
    if !source.starts_with("---") {
        return Ok(build_post(slug, Frontmatter::default(), source));
    }

    let gray_matter = Matter::<YAML>::new();
    let parsed = gray_matter
        .parse::<Frontmatter>(source)
        .map_err(|err| PostError::Frontmatter {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    Ok(build_post(slug, parsed.data.unwrap_or_default(), &parsed.content))
}

fn build_post(slug: &str, front: Frontmatter, body: &str) -> Post {
    Post {
        slug: slug.to_string(),
        title: front.title,
        date: front.date,
        description: front.description,
        tags: front.tags,
        icon: if front.icon.is_empty() {
            DEFAULT_ICON.to_string()
        } else {
            front.icon
        },
        content: body.trim().to_string(),
    }
}
