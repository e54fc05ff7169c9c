use crate::error::PostError;
use crate::post::{Post, parse_post};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const EXTENSION: &str = "md";

/// Markdown posts stored as `<slug>.md` files in one flat directory.
#[derive(Clone, Debug)]
pub struct PostRepository {
    dir: PathBuf,
}

impl PostRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads every post, newest first. A missing directory holds no posts;
    /// files that cannot be read or parsed are skipped with a warning.
    pub fn all_posts(&self) -> Result<Vec<Post>, PostError> {
        if !self.dir.is_dir() {
            debug!(dir = %self.dir.display(), "posts directory does not exist");
            return Ok(Vec::new());
        }

        let mut posts = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(slug) = path.file_stem().and_then(|stem| stem.to_str()) else {
                warn!(path = %path.display(), "skipping post with a non UTF-8 file name");
                continue;
            };
            match load(slug, &path) {
                Ok(post) => {
                    debug!(slug = %post.slug, date = %post.date, "loaded post");
                    posts.push(post);
                }
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable post"),
            }
        }

        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
        Ok(posts)
    }

    pub fn post_by_slug(&self, slug: &str) -> Result<Post, PostError> {
        if !is_valid_slug(slug) {
            warn!(slug, "rejecting invalid slug");
            return Err(PostError::InvalidSlug(slug.to_string()));
        }

        let path = self.dir.join(format!("{}.{}", slug, EXTENSION));
        if path.parent() != Some(self.dir.as_path()) {
            warn!(slug, "rejecting slug that escapes the posts directory");
            return Err(PostError::InvalidSlug(slug.to_string()));
        }
        if !path.is_file() {
            return Err(PostError::NotFound(slug.to_string()));
        }

        load(slug, &path)
    }
}

fn load(slug: &str, path: &Path) -> Result<Post, PostError> {
    let source = fs::read_to_string(path)?;
    parse_post(slug, path, &source)
}

/// Slugs are limited to ASCII letters, digits, `-` and `_`, which keeps every
/// lookup inside the posts directory.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}
