use once_cell::sync::Lazy;
use regex::Regex;

static IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!\[(.*?)\]\((.*?)\)$").expect("image pattern compiles"));

const FENCE: &str = "```";

/// The block-level role of a single source line, independent of parser state.
///
/// Lines inside an open fenced code block never reach the classifier; the
/// state machine only checks them for a closing fence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineKind<'a> {
    Fence { info: &'a str },
    Heading { level: u8, text: &'a str },
    ListItem { body: &'a str },
    Blank,
    Command,
    Image { alt: &'a str, path: &'a str },
    Caption { text: &'a str },
    Paragraph,
}

pub fn classify(line: &str) -> LineKind<'_> {
    if let Some(info) = fence_info(line) {
        return LineKind::Fence { info };
    }
    if let Some((level, text)) = heading(line) {
        return LineKind::Heading { level, text };
    }
    if let Some(body) = line.strip_prefix("- ") {
        return LineKind::ListItem { body };
    }

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with('$') {
        return LineKind::Command;
    }
    if let Some(captures) = IMAGE.captures(trimmed) {
        let alt = captures.get(1).map_or("", |m| m.as_str());
        let path = captures.get(2).map_or("", |m| m.as_str().trim());
        return LineKind::Image { alt, path };
    }
    if let Some(text) = caption(trimmed) {
        return LineKind::Caption { text };
    }
    LineKind::Paragraph
}

/// Returns the trimmed language tag when `line` is a fence delimiter.
pub(crate) fn fence_info(line: &str) -> Option<&str> {
    line.strip_prefix(FENCE).map(str::trim)
}

fn heading(line: &str) -> Option<(u8, &str)> {
    // Prefixes are disjoint by the number of `#` before the space.
    for (level, prefix) in [(1, "# "), (2, "## "), (3, "### "), (4, "#### ")] {
        if let Some(text) = line.strip_prefix(prefix) {
            return Some((level, text));
        }
    }
    None
}

fn caption(trimmed: &str) -> Option<&str> {
    let is_caption = trimmed.starts_with('*')
        && trimmed.ends_with('*')
        && trimmed.chars().count() > 2
        && !trimmed.contains("**");
    if is_caption {
        Some(&trimmed[1..trimmed.len() - 1])
    } else {
        None
    }
}
