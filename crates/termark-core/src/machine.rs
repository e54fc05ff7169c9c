use crate::diagnostic::{Diagnostic, W_UNCLOSED_FENCE, W_UNSAFE_IMAGE, W_UNSAFE_LINK};
use crate::emit::{HtmlWriter, sanitize_html};
use crate::inline::{render_list_item, render_paragraph};
use crate::line::{LineKind, classify, fence_info};
use crate::validate::is_safe_image_path;
use tracing::debug;

pub struct FormatResult {
    pub html: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Converts one post body into an HTML fragment. Never fails: malformed input
/// degrades to escaped paragraph text and unsafe targets are dropped.
pub fn format_content(content: &str) -> String {
    format_content_with_report(content).html
}

/// Same output as [`format_content`], plus a record of every element that was
/// dropped or discarded along the way.
pub fn format_content_with_report(content: &str) -> FormatResult {
    let mut machine = Machine::new();
    for (index, line) in split_lines(content).enumerate() {
        machine.step(index, line);
    }
    machine.finish()
}

pub fn format_content_sanitized(content: &str) -> String {
    sanitize_html(&format_content(content))
}

fn split_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Block state carried from one line to the next within a single call.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct ParserState {
    pub(crate) in_code_block: bool,
    pub(crate) code_buffer: String,
    pub(crate) code_language: String,
    /// Line index of the opening fence while a code block is open.
    pub(crate) fence_line: usize,
    pub(crate) in_list: bool,
    pub(crate) image_block_open: bool,
}

pub(crate) struct Machine {
    pub(crate) state: ParserState,
    writer: HtmlWriter,
    diagnostics: Vec<Diagnostic>,
}

impl Machine {
    pub(crate) fn new() -> Self {
        Self {
            state: ParserState::default(),
            writer: HtmlWriter::new(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn step(&mut self, index: usize, line: &str) {
        if self.state.in_code_block {
            if fence_info(line).is_some() {
                self.close_fence();
            } else {
                self.state.code_buffer.push_str(line);
                self.state.code_buffer.push('\n');
            }
            return;
        }

        let kind = classify(line);
        if let LineKind::Fence { info } = kind {
            self.open_fence(index, info);
            return;
        }

        // List membership is settled once here, so every branch below sees
        // `in_list` only for list items.
        self.transition_list(&kind);

        match kind {
            LineKind::Fence { .. } => {}
            LineKind::Heading { level, text } => self.writer.heading(level, text),
            LineKind::ListItem { body } => self.writer.list_item(&render_list_item(body)),
            LineKind::Blank => {
                // An open image wrapper waits for a possible caption.
                if !self.state.image_block_open {
                    self.writer.line_break();
                }
            }
            LineKind::Command => self.writer.command(line),
            LineKind::Image { alt, path } => {
                self.close_image();
                if is_safe_image_path(path) {
                    self.writer.open_image(alt, path);
                    self.state.image_block_open = true;
                } else {
                    debug!(line = index, path, "dropping image with unsafe source");
                    self.diagnostics.push(Diagnostic::warning(
                        index,
                        W_UNSAFE_IMAGE,
                        format!("image source `{}` is not allowed", path),
                    ));
                }
            }
            LineKind::Caption { text } => {
                if self.state.image_block_open {
                    self.writer.image_caption(text);
                    self.close_image();
                } else {
                    self.writer.caption(text);
                }
            }
            LineKind::Paragraph => {
                self.close_image();
                let inline = render_paragraph(line);
                for url in inline.unsafe_links {
                    debug!(line = index, url = %url, "dropping link with unsafe target");
                    self.diagnostics.push(Diagnostic::warning(
                        index,
                        W_UNSAFE_LINK,
                        format!("link target `{}` is not allowed", url),
                    ));
                }
                self.writer.paragraph(&inline.html);
            }
        }
    }

    pub(crate) fn finish(mut self) -> FormatResult {
        if self.state.in_code_block {
            // The partial block is discarded, never auto-closed.
            debug!(line = self.state.fence_line, "discarding unterminated code block");
            self.diagnostics.push(Diagnostic::warning(
                self.state.fence_line,
                W_UNCLOSED_FENCE,
                "code block is never closed; its contents were dropped",
            ));
        }
        self.close_list();
        self.close_image();
        FormatResult {
            html: self.writer.finish(),
            diagnostics: self.diagnostics,
        }
    }

    fn open_fence(&mut self, index: usize, info: &str) {
        self.close_list();
        self.state.in_code_block = true;
        self.state.fence_line = index;
        self.state.code_language = info.to_string();
        self.state.code_buffer.clear();
    }

    fn close_fence(&mut self) {
        self.state.in_code_block = false;
        self.writer
            .code_block(&self.state.code_language, &self.state.code_buffer);
        self.state.code_buffer.clear();
        self.state.code_language.clear();
    }

    fn transition_list(&mut self, kind: &LineKind<'_>) {
        let is_item = matches!(kind, LineKind::ListItem { .. });
        if is_item && !self.state.in_list {
            self.writer.open_list();
            self.state.in_list = true;
        } else if !is_item {
            self.close_list();
        }
    }

    fn close_list(&mut self) {
        if self.state.in_list {
            self.writer.close_list();
            self.state.in_list = false;
        }
    }

    fn close_image(&mut self) {
        if self.state.image_block_open {
            self.writer.close_image();
            self.state.image_block_open = false;
        }
    }

    #[cfg(test)]
    fn html(&self) -> &str {
        self.writer.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::{Machine, format_content_with_report};
    use crate::diagnostic::{W_UNCLOSED_FENCE, W_UNSAFE_IMAGE, W_UNSAFE_LINK};

    #[test]
    fn fence_buffers_until_closed() {
        let mut machine = Machine::new();
        machine.step(0, "```rust");
        assert!(machine.state.in_code_block);
        assert_eq!(machine.state.code_language, "rust");

        machine.step(1, "fn main() {}");
        machine.step(2, "- not a list");
        assert_eq!(machine.state.code_buffer, "fn main() {}\n- not a list\n");
        assert!(!machine.state.in_list);
        assert_eq!(machine.html(), "");

        machine.step(3, "```");
        assert!(!machine.state.in_code_block);
        assert!(machine.state.code_buffer.is_empty());
        assert!(machine.html().contains("fn main() {}\n- not a list</code>"));
    }

    #[test]
    fn opening_fence_closes_list() {
        let mut machine = Machine::new();
        machine.step(0, "- item");
        assert!(machine.state.in_list);
        machine.step(1, "```");
        assert!(!machine.state.in_list);
        assert!(machine.html().ends_with("</ul>"));
    }

    #[test]
    fn list_state_follows_items() {
        let mut machine = Machine::new();
        machine.step(0, "- one");
        machine.step(1, "- two");
        assert!(machine.state.in_list);
        machine.step(2, "");
        assert!(!machine.state.in_list);
        assert_eq!(machine.html().matches("<ul").count(), 1);
        assert_eq!(machine.html().matches("</ul>").count(), 1);
    }

    #[test]
    fn image_wrapper_survives_blank_line() {
        let mut machine = Machine::new();
        machine.step(0, "![Alt](/a.png)");
        assert!(machine.state.image_block_open);
        machine.step(1, "");
        assert!(machine.state.image_block_open);
        assert!(!machine.html().contains("<br />"));
        machine.step(2, "*Caption*");
        assert!(!machine.state.image_block_open);
        assert!(machine.html().ends_with("Caption</p></div>"));
    }

    #[test]
    fn unsafe_image_leaves_state_closed() {
        let mut machine = Machine::new();
        machine.step(0, "![x](javascript:alert(1))");
        assert!(!machine.state.image_block_open);
        assert_eq!(machine.html(), "");
    }

    #[test]
    fn reports_each_degradation() {
        let result = format_content_with_report(
            "[a](javascript:x) [b](data:y)\n![c](file:///etc/passwd)\n```\nlost",
        );
        let codes: Vec<(usize, &str)> = result
            .diagnostics
            .iter()
            .map(|diag| (diag.line, diag.code))
            .collect();
        assert_eq!(
            codes,
            vec![
                (0, W_UNSAFE_LINK),
                (0, W_UNSAFE_LINK),
                (1, W_UNSAFE_IMAGE),
                (2, W_UNCLOSED_FENCE),
            ]
        );
        assert!(!result.html.contains("lost"));
    }

    #[test]
    fn clean_input_has_no_diagnostics() {
        let result = format_content_with_report("# Title\n\n- a\n- b\n\n[ok](/x)");
        assert!(result.diagnostics.is_empty());
    }
}
