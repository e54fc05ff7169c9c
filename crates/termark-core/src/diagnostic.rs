/// A link was reduced to its label because its target failed the URL allow-list.
pub const W_UNSAFE_LINK: &str = "W_UNSAFE_LINK";
/// An image directive was suppressed because its source failed the path allow-list.
pub const W_UNSAFE_IMAGE: &str = "W_UNSAFE_IMAGE";
/// Input ended inside a fenced code block; the buffered lines were discarded.
pub const W_UNCLOSED_FENCE: &str = "W_UNCLOSED_FENCE";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    /// Zero-based line index in the formatted content.
    pub line: usize,
    pub severity: DiagnosticSeverity,
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(line: usize, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            line,
            severity: DiagnosticSeverity::Warning,
            code,
            message: message.into(),
        }
    }
}

/// Formatting never fails, so every diagnostic is a warning.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiagnosticSeverity {
    Warning,
}

impl DiagnosticSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticSeverity::Warning => "warning",
        }
    }
}
