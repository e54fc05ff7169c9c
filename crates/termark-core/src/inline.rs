//! Inline transforms for paragraph and list-item text.
//!
//! Text moves through the passes as a sequence of [`Segment`]s. Markup
//! produced by a pass is `Trusted` and opaque to every later pass: a bold or
//! code span whose content would overlap it is left as literal text. The
//! inner text of a link label or bold span goes through the remaining passes
//! before it is wrapped, so `**`x`**` nests a code span inside the highlight.
//! `Raw` text is escaped exactly once, when the segments are rendered.

use crate::emit::{HIGHLIGHT_CLOSE, HIGHLIGHT_OPEN, INLINE_CODE_CLOSE, INLINE_CODE_OPEN};
use crate::escape::escape_html;
use crate::validate::is_safe_url;
use once_cell::sync::Lazy;
use regex::Regex;

static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link pattern compiles"));

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Segment {
    Raw(String),
    Trusted(String),
}

pub(crate) struct InlineHtml {
    pub(crate) html: String,
    /// Link targets that failed validation, in source order.
    pub(crate) unsafe_links: Vec<String>,
}

const PARAGRAPH_PASSES: &[Delimiter] = &[Delimiter::Bold, Delimiter::Code];
const LIST_ITEM_PASSES: &[Delimiter] = &[Delimiter::Bold];

/// Links, then bold, then inline code, then escaping of everything left over.
pub(crate) fn render_paragraph(line: &str) -> InlineHtml {
    let (segments, unsafe_links) = apply_links(line);
    let segments = apply_passes(segments, PARAGRAPH_PASSES);
    InlineHtml {
        html: render(&segments),
        unsafe_links,
    }
}

/// List items only recognize bold spans.
pub(crate) fn render_list_item(body: &str) -> String {
    render_inner(body, LIST_ITEM_PASSES)
}

pub(crate) fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Raw(text) => out.push_str(&escape_html(text)),
            Segment::Trusted(html) => out.push_str(html),
        }
    }
    out
}

fn apply_links(line: &str) -> (Vec<Segment>, Vec<String>) {
    let mut builder = SegmentBuilder::default();
    let mut unsafe_links = Vec::new();
    let mut last = 0;

    for captures in LINK.captures_iter(line) {
        let (Some(whole), Some(text), Some(url)) = (captures.get(0), captures.get(1), captures.get(2))
        else {
            continue;
        };
        builder.push_raw(&line[last..whole.start()]);
        if is_safe_url(url.as_str()) {
            let label = render_inner(text.as_str(), PARAGRAPH_PASSES);
            builder.push_trusted(anchor(&label, url.as_str().trim()));
        } else {
            // Drop the link, keep the label as ordinary text.
            unsafe_links.push(url.as_str().to_string());
            builder.push_raw(text.as_str());
        }
        last = whole.end();
    }
    builder.push_raw(&line[last..]);

    (builder.finish(), unsafe_links)
}

/// `label` is already rendered HTML.
fn anchor(label: &str, url: &str) -> String {
    format!(
        "<a href=\"{}\" class=\"text-terminal-green hover:text-white underline\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
        escape_html(url),
        label
    )
}

#[derive(Clone, Copy, Debug)]
enum Delimiter {
    Bold,
    Code,
}

impl Delimiter {
    fn marker(self) -> &'static [char] {
        match self {
            Delimiter::Bold => &['*', '*'],
            Delimiter::Code => &['`'],
        }
    }

    fn wrap(self, content: &str, inner: &[Delimiter]) -> String {
        let (open, close) = match self {
            Delimiter::Bold => (HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE),
            Delimiter::Code => (INLINE_CODE_OPEN, INLINE_CODE_CLOSE),
        };
        format!("{}{}{}", open, render_inner(content, inner), close)
    }
}

/// Runs each pass in order. Content matched by a pass is rendered with the
/// passes that follow it.
fn apply_passes(segments: Vec<Segment>, passes: &[Delimiter]) -> Vec<Segment> {
    passes
        .iter()
        .enumerate()
        .fold(segments, |segments, (index, delimiter)| {
            apply_delimited(&segments, *delimiter, &passes[index + 1..])
        })
}

fn render_inner(text: &str, passes: &[Delimiter]) -> String {
    render(&apply_passes(vec![Segment::Raw(text.to_string())], passes))
}

#[derive(Clone, Copy, Debug)]
enum Atom<'a> {
    Char(char),
    Trusted(&'a str),
}

/// Replaces `marker content marker` runs with trusted spans, matching the
/// leftmost opening marker against the nearest closing one.
fn apply_delimited(segments: &[Segment], delimiter: Delimiter, inner: &[Delimiter]) -> Vec<Segment> {
    let atoms = atomize(segments);
    let marker = delimiter.marker();
    let mut builder = SegmentBuilder::default();
    let mut i = 0;

    while i < atoms.len() {
        if !marker_at(&atoms, i, marker) {
            builder.push_atom(atoms[i]);
            i += 1;
            continue;
        }

        let content_start = i + marker.len();
        let Some(close) = (content_start..atoms.len()).find(|&j| marker_at(&atoms, j, marker)) else {
            // No closing marker anywhere to the right, so no later opening
            // marker can close either.
            for atom in &atoms[i..] {
                builder.push_atom(*atom);
            }
            break;
        };
        let end = close + marker.len();
        let content = &atoms[content_start..close];

        if content.iter().any(|atom| matches!(atom, Atom::Trusted(_))) {
            for atom in &atoms[i..end] {
                builder.push_atom(*atom);
            }
        } else {
            let text: String = content
                .iter()
                .filter_map(|atom| match atom {
                    Atom::Char(ch) => Some(*ch),
                    Atom::Trusted(_) => None,
                })
                .collect();
            builder.push_trusted(delimiter.wrap(&text, inner));
        }
        i = end;
    }

    builder.finish()
}

fn atomize(segments: &[Segment]) -> Vec<Atom<'_>> {
    let mut atoms = Vec::new();
    for segment in segments {
        match segment {
            Segment::Raw(text) => atoms.extend(text.chars().map(Atom::Char)),
            Segment::Trusted(html) => atoms.push(Atom::Trusted(html.as_str())),
        }
    }
    atoms
}

fn marker_at(atoms: &[Atom<'_>], index: usize, marker: &[char]) -> bool {
    if index + marker.len() > atoms.len() {
        return false;
    }
    atoms[index..index + marker.len()]
        .iter()
        .zip(marker)
        .all(|(atom, expected)| matches!(atom, Atom::Char(ch) if ch == expected))
}

/// Collects segments, merging adjacent raw text so later passes can match
/// delimiters across the seams left by earlier passes.
#[derive(Default)]
struct SegmentBuilder {
    segments: Vec<Segment>,
}

impl SegmentBuilder {
    fn push_raw(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Raw(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Raw(text.to_string()));
        }
    }

    fn push_char(&mut self, ch: char) {
        if let Some(Segment::Raw(last)) = self.segments.last_mut() {
            last.push(ch);
        } else {
            self.segments.push(Segment::Raw(ch.to_string()));
        }
    }

    fn push_trusted(&mut self, html: String) {
        self.segments.push(Segment::Trusted(html));
    }

    fn push_atom(&mut self, atom: Atom<'_>) {
        match atom {
            Atom::Char(ch) => self.push_char(ch),
            Atom::Trusted(html) => self.push_trusted(html.to_string()),
        }
    }

    fn finish(self) -> Vec<Segment> {
        self.segments
    }
}
