use crate::escape::escape_html;
use ammonia::Builder;
use std::collections::{HashMap, HashSet};

pub(crate) const HIGHLIGHT_OPEN: &str =
    "<span class=\"highlight bg-terminal-bg px-1 py-0.5 rounded border border-terminal-border\">";
pub(crate) const HIGHLIGHT_CLOSE: &str = "</span>";
pub(crate) const INLINE_CODE_OPEN: &str = "<code class=\"bg-terminal-bg px-1 py-0.5 text-terminal-green rounded text-sm border border-terminal-border\">";
pub(crate) const INLINE_CODE_CLOSE: &str = "</code>";

const HEADING_CLASSES: [&str; 4] = [
    "text-3xl font-bold text-white mb-4 mt-8",
    "text-xl font-semibold text-white mb-4 mt-8",
    "text-lg font-semibold text-white mb-3 mt-6",
    "text-base font-semibold text-white mb-2 mt-4",
];
const PROMPT: &str = "<span class=\"text-terminal-green\"># </span>";
const LIST_OPEN: &str = "<ul class=\"list-none space-y-2 mb-6 pl-4\">";
const LIST_CLOSE: &str = "</ul>";
const IMAGE_WRAPPER_OPEN: &str = "<div class=\"my-8\">";
const IMAGE_WRAPPER_CLOSE: &str = "</div>";
const IMAGE_CLASSES: &str = "w-full rounded border border-terminal-border cursor-pointer hover:opacity-90 transition-opacity blog-image";
const EXPAND_HINT: &str = "<p class=\"text-terminal-gray text-xs italic text-center mt-1 opacity-75\"><i class=\"fa-solid fa-expand mr-1\"></i> Click to expand</p>";

/// Append-only sink for the fragments produced by the state machine.
///
/// Every method takes text that is either escaped here or was produced by the
/// inline formatter, which escapes everything it does not generate itself.
#[derive(Debug, Default)]
pub(crate) struct HtmlWriter {
    out: String,
}

impl HtmlWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn heading(&mut self, level: u8, text: &str) {
        let index = usize::from(level.clamp(1, 4)) - 1;
        let level = index + 1;
        self.out.push_str(&format!(
            "<h{} class=\"{}\">{}{}</h{}>",
            level,
            HEADING_CLASSES[index],
            PROMPT,
            escape_html(text),
            level
        ));
    }

    pub(crate) fn open_list(&mut self) {
        self.out.push_str(LIST_OPEN);
    }

    pub(crate) fn close_list(&mut self) {
        self.out.push_str(LIST_CLOSE);
    }

    pub(crate) fn list_item(&mut self, html: &str) {
        self.out.push_str("<li class=\"text-terminal-gray\"><span class=\"text-terminal-green\">→</span> ");
        self.out.push_str(html);
        self.out.push_str("</li>");
    }

    pub(crate) fn line_break(&mut self) {
        self.out.push_str("<br />");
    }

    pub(crate) fn command(&mut self, line: &str) {
        self.out.push_str("<div class=\"text-terminal-gray mb-6\"><span class=\"text-terminal-green\">");
        self.out.push_str(&escape_html(line));
        self.out.push_str("</span></div>");
    }

    /// Opens an image wrapper and leaves it open for a trailing caption.
    pub(crate) fn open_image(&mut self, alt: &str, path: &str) {
        let alt = escape_html(alt);
        let path = escape_html(path);
        self.out.push_str(IMAGE_WRAPPER_OPEN);
        self.out.push_str(&format!(
            "<img src=\"{path}\" alt=\"{alt}\" class=\"{IMAGE_CLASSES}\" data-image-src=\"{path}\" data-image-alt=\"{alt}\" />"
        ));
        self.out.push_str(EXPAND_HINT);
    }

    pub(crate) fn close_image(&mut self) {
        self.out.push_str(IMAGE_WRAPPER_CLOSE);
    }

    pub(crate) fn image_caption(&mut self, text: &str) {
        self.out.push_str("<p class=\"text-terminal-gray text-sm italic mt-2 mb-6 text-center\">");
        self.out.push_str(&escape_html(text));
        self.out.push_str("</p>");
    }

    pub(crate) fn caption(&mut self, text: &str) {
        self.out.push_str("<p class=\"text-terminal-gray text-sm italic mb-6 text-center\">");
        self.out.push_str(&escape_html(text));
        self.out.push_str("</p>");
    }

    pub(crate) fn paragraph(&mut self, html: &str) {
        self.out.push_str("<p class=\"text-terminal-gray leading-relaxed mb-6\">");
        self.out.push_str(html);
        self.out.push_str("</p>");
    }

    /// Emits a closed fenced block. The whole buffer is escaped at once, and
    /// the language prompt is omitted when no language was declared.
    pub(crate) fn code_block(&mut self, language: &str, code: &str) {
        let escaped_code = escape_html(code);
        self.out.push_str("<div class=\"bg-terminal-bg border border-terminal-border rounded p-4 my-6 overflow-x-auto code-block-wrapper\">");
        if !language.is_empty() {
            self.out.push_str("<div class=\"text-terminal-gray text-sm mb-2\"><span class=\"text-terminal-green\">$</span> ");
            self.out.push_str(&escape_html(language));
            self.out.push_str("</div>");
        }
        self.out.push_str("<pre class=\"text-terminal-green text-sm code-block-pre\"><code class=\"code-block-code\">");
        self.out.push_str(escaped_code.trim());
        self.out.push_str("</code></pre></div>");
    }

    #[cfg(test)]
    pub(crate) fn as_str(&self) -> &str {
        &self.out
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}

/// Re-parses formatter output through an allow-list restricted to the tag
/// vocabulary the formatter emits.
pub fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&'static str> = [
        "a", "br", "code", "div", "h1", "h2", "h3", "h4", "i", "img", "li", "p", "pre", "span",
        "ul",
    ]
    .iter()
    .copied()
    .collect();

    let mut generic_attributes: HashSet<&'static str> = HashSet::new();
    generic_attributes.insert("class");

    let mut tag_attributes = HashMap::new();
    // `rel` is managed by ammonia's link_rel and must not be listed here.
    tag_attributes.insert("a", ["href", "target"].iter().copied().collect());
    tag_attributes.insert("img", ["src", "alt"].iter().copied().collect());

    let mut generic_attribute_prefixes = HashSet::new();
    generic_attribute_prefixes.insert("data-");

    let url_schemes: HashSet<&'static str> = ["http", "https", "mailto"].iter().copied().collect();

    Builder::new()
        .tags(tags)
        .generic_attributes(generic_attributes)
        .tag_attributes(tag_attributes)
        .generic_attribute_prefixes(generic_attribute_prefixes)
        .url_schemes(url_schemes)
        .link_rel(Some("noopener noreferrer"))
        .clean(html)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{HtmlWriter, sanitize_html};

    #[test]
    fn heading_escapes_text_and_adds_prompt() {
        let mut writer = HtmlWriter::new();
        writer.heading(2, "a <b>");
        let html = writer.finish();
        assert!(html.starts_with("<h2 class=\"text-xl"));
        assert!(html.contains("<span class=\"text-terminal-green\"># </span>a &lt;b&gt;</h2>"));
    }

    #[test]
    fn code_block_without_language_has_no_prompt() {
        let mut writer = HtmlWriter::new();
        writer.code_block("", "plain code\n");
        let html = writer.finish();
        assert!(!html.contains("</span> "));
        assert!(html.contains("<code class=\"code-block-code\">plain code</code>"));
    }

    #[test]
    fn code_block_escapes_language() {
        let mut writer = HtmlWriter::new();
        writer.code_block("<js>", "x\n");
        assert!(writer.as_str().contains("</span> &lt;js&gt;</div>"));
    }

    #[test]
    fn open_image_leaves_wrapper_open() {
        let mut writer = HtmlWriter::new();
        writer.open_image("Alt", "/a.png");
        let html = writer.finish();
        assert!(html.starts_with("<div class=\"my-8\"><img src=\"/a.png\" alt=\"Alt\""));
        assert!(html.contains("data-image-src=\"/a.png\""));
        assert!(!html.ends_with("</div>"));
    }

    #[test]
    fn sanitizer_keeps_formatter_vocabulary() {
        let html = "<p class=\"x\"><a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">ok</a></p>";
        let cleaned = sanitize_html(html);
        assert!(cleaned.contains("href=\"https://example.com\""));
        assert!(cleaned.contains("class=\"x\""));
        assert!(cleaned.contains("rel=\"noopener noreferrer\""));
    }

    #[test]
    fn sanitizer_strips_foreign_markup() {
        let cleaned = sanitize_html("<p>hi<script>alert(1)</script><img src=x onerror=alert(1)></p>");
        assert!(!cleaned.contains("<script"));
        assert!(!cleaned.contains("onerror"));
    }
}
