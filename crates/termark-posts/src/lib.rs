mod error;
mod post;
mod repository;
mod search;
pub mod utils;

pub use error::PostError;
pub use post::{DEFAULT_ICON, Post, parse_post};
pub use repository::{PostRepository, is_valid_slug};
pub use search::{DEFAULT_PER_PAGE, MAX_QUERY_LEN, Page, normalize_query, paginate, search_posts};
