mod diagnostic;
mod emit;
mod escape;
mod inline;
mod line;
mod machine;
mod validate;

pub use diagnostic::{
    Diagnostic, DiagnosticSeverity, W_UNCLOSED_FENCE, W_UNSAFE_IMAGE, W_UNSAFE_LINK,
};
pub use emit::sanitize_html;
pub use escape::escape_html;
pub use line::{LineKind, classify};
pub use machine::{
    FormatResult, format_content, format_content_sanitized, format_content_with_report,
};
pub use validate::{is_safe_image_path, is_safe_url};
