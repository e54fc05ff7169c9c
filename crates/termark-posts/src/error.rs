use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid frontmatter in {path}: {message}")]
    Frontmatter { path: PathBuf, message: String },
    #[error("invalid slug: {0:?}")]
    InvalidSlug(String),
    #[error("post not found: {0}")]
    NotFound(String),
}
