use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme as SyntectTheme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::{debug, warn};

const BASE_CSS: &str = include_str!("../assets/termark.css");
const BASE_JS: &str = include_str!("../assets/termark.js");

const BLOCK_OPEN: &str = "<div class=\"bg-terminal-bg border border-terminal-border rounded p-4 my-6 overflow-x-auto code-block-wrapper\">";
const BLOCK_CLOSE: &str = "</code></pre></div>";
const LANGUAGE_PROMPT: &str = "<span class=\"text-terminal-green\">$</span> ";
const CODE_OPEN: &str = "<code class=\"code-block-code\">";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    /// Dark palette, switching to light when the reader prefers it.
    #[default]
    Auto,
    Light,
    Dark,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    theme: Theme,
    custom_vars: BTreeMap<String, String>,
}

impl Renderer {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            custom_vars: BTreeMap::new(),
        }
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_vars.insert(key.into(), value.into());
        self
    }

    pub fn stylesheet(&self) -> String {
        let mut out = String::new();
        let (dark_vars, light_vars) = default_theme_vars();

        match self.theme {
            Theme::Auto => {
                out.push_str(&root_block(&dark_vars, "dark light"));
                out.push_str("@media (prefers-color-scheme: light) {\n");
                out.push_str(&indent(&root_block(&light_vars, "light")));
                out.push_str("}\n");
            }
            Theme::Light => out.push_str(&root_block(&light_vars, "light")),
            Theme::Dark => out.push_str(&root_block(&dark_vars, "dark")),
        }

        if !self.custom_vars.is_empty() {
            out.push_str(&root_block(&self.custom_vars, ""));
        }

        out.push_str(BASE_CSS);
        out
    }

    /// Wraps a fragment in a standalone HTML5 document.
    pub fn embed_html(
        &self,
        html: &str,
        title: &str,
        with_inline_css: bool,
        with_inline_js: bool,
    ) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n");
        out.push_str("<html lang=\"en\">\n");
        out.push_str("<head>\n");
        out.push_str("  <meta charset=\"utf-8\" />\n");
        out.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
        out.push_str("  <title>");
        out.push_str(&escape_html_code(title));
        out.push_str("</title>\n");
        if with_inline_css {
            out.push_str("  <style>\n");
            out.push_str(&self.stylesheet());
            out.push_str("\n  </style>\n");
        }
        out.push_str("</head>\n");
        out.push_str("<body>\n");
        out.push_str("<main class=\"termark-page\">\n");
        out.push_str(html);
        if !html.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("</main>\n");
        if with_inline_js {
            out.push_str("  <script>\n");
            out.push_str(BASE_JS);
            out.push_str("\n  </script>\n");
        }
        out.push_str("</body>\n");
        out.push_str("</html>\n");
        out
    }

    pub fn generate_files(&self, out_dir: &Path) -> io::Result<()> {
        fs::create_dir_all(out_dir)?;
        fs::write(out_dir.join("termark.css"), self.stylesheet())?;
        fs::write(out_dir.join("termark.js"), BASE_JS)?;
        debug!(dir = %out_dir.display(), "wrote stylesheet and script");
        Ok(())
    }

    /// Replaces the plain text of every fenced code block with syntax
    /// highlighted spans, using the language named in the block's prompt.
    pub fn highlight_html(&self, html: &str) -> String {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let theme_set = ThemeSet::load_defaults();
        let Some(theme) = pick_theme(self.theme, &theme_set) else {
            warn!("no highlighting theme available; leaving code blocks plain");
            return html.to_string();
        };
        highlight_html_inner(html, &syntax_set, theme)
    }
}

/// Terminal palette as `(dark, light)`.
fn default_theme_vars() -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    let dark = BTreeMap::from([
        ("--terminal-bg".to_string(), "#0a0a0a".to_string()),
        ("--terminal-surface".to_string(), "#1a1a1a".to_string()),
        ("--terminal-border".to_string(), "#333333".to_string()),
        ("--terminal-fg".to_string(), "#ffffff".to_string()),
        ("--terminal-green".to_string(), "#00ff41".to_string()),
        ("--terminal-gray".to_string(), "#a0a0a0".to_string()),
        ("--terminal-red".to_string(), "#ff4444".to_string()),
        ("--terminal-yellow".to_string(), "#ffff44".to_string()),
    ]);

    let light = BTreeMap::from([
        ("--terminal-bg".to_string(), "#f6f6f2".to_string()),
        ("--terminal-surface".to_string(), "#ebebe6".to_string()),
        ("--terminal-border".to_string(), "#c8c8c0".to_string()),
        ("--terminal-fg".to_string(), "#111111".to_string()),
        ("--terminal-green".to_string(), "#007a1f".to_string()),
        ("--terminal-gray".to_string(), "#4a4a4a".to_string()),
        ("--terminal-red".to_string(), "#c62828".to_string()),
        ("--terminal-yellow".to_string(), "#8a6d00".to_string()),
    ]);

    (dark, light)
}

fn root_block(vars: &BTreeMap<String, String>, color_scheme: &str) -> String {
    let mut out = String::new();
    out.push_str(":root {\n");
    if !color_scheme.is_empty() {
        out.push_str("  color-scheme: ");
        out.push_str(color_scheme);
        out.push_str(";\n");
    }
    for (key, value) in vars {
        out.push_str("  ");
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push_str(";\n");
    }
    out.push_str("}\n");
    out
}

fn indent(block: &str) -> String {
    block.lines().map(|line| format!("  {}\n", line)).collect()
}

fn pick_theme(theme: Theme, theme_set: &ThemeSet) -> Option<&SyntectTheme> {
    let candidates = match theme {
        Theme::Dark | Theme::Auto => ["base16-eighties.dark", "base16-ocean.dark", "Solarized (dark)"],
        Theme::Light => ["InspiredGitHub", "Solarized (light)", "base16-ocean.light"],
    };
    candidates
        .iter()
        .find_map(|name| theme_set.themes.get(*name))
        .or_else(|| theme_set.themes.values().next())
}

fn highlight_html_inner(html: &str, syntax_set: &SyntaxSet, theme: &SyntectTheme) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find(BLOCK_OPEN) {
        out.push_str(&rest[..start]);
        let after_start = &rest[start..];
        let end = match after_start.find(BLOCK_CLOSE) {
            Some(index) => index + BLOCK_CLOSE.len(),
            None => {
                out.push_str(after_start);
                return out;
            }
        };
        let block = &after_start[..end];
        out.push_str(&highlight_block(block, syntax_set, theme));
        rest = &after_start[end..];
    }

    out.push_str(rest);
    out
}

fn highlight_block(block: &str, syntax_set: &SyntaxSet, theme: &SyntectTheme) -> String {
    let code_start = match block.find(CODE_OPEN) {
        Some(index) => index + CODE_OPEN.len(),
        None => return block.to_string(),
    };
    let code_end = match block[code_start..].find("</code>") {
        Some(index) => code_start + index,
        None => return block.to_string(),
    };

    let language = extract_language(&block[..code_start]);
    let syntax = language
        .as_deref()
        .and_then(|token| syntax_set.find_syntax_by_token(token))
        .unwrap_or_else(|| syntax_set.find_syntax_plain_text());
    debug!(language = ?language, syntax = %syntax.name, "highlighting code block");

    let code = unescape_html_code(&block[code_start..code_end]);
    let highlighted = highlight_code(&code, syntax_set, syntax, theme);

    let mut out = String::with_capacity(block.len() + highlighted.len());
    out.push_str(&block[..code_start]);
    out.push_str(&highlighted);
    out.push_str(&block[code_end..]);
    out
}

fn highlight_code(
    code: &str,
    syntax_set: &SyntaxSet,
    syntax: &SyntaxReference,
    theme: &SyntectTheme,
) -> String {
    let mut out = String::with_capacity(code.len());
    let mut highlighter = HighlightLines::new(syntax, theme);
    for line in LinesWithEndings::from(code) {
        out.push_str(&highlight_line(line, syntax_set, &mut highlighter));
    }
    out
}

fn highlight_line(
    line: &str,
    syntax_set: &SyntaxSet,
    highlighter: &mut HighlightLines,
) -> String {
    match highlighter.highlight_line(line, syntax_set) {
        Ok(ranges) => match styled_line_to_highlighted_html(&ranges, IncludeBackground::No) {
            Ok(html) => strip_font_weight(&html),
            Err(_) => escape_html_code(line),
        },
        Err(_) => escape_html_code(line),
    }
}

/// The language is the escaped text between the `$` prompt and the end of
/// its line; blocks without a prompt have none.
fn extract_language(head: &str) -> Option<String> {
    let start = head.find(LANGUAGE_PROMPT)? + LANGUAGE_PROMPT.len();
    let end = head[start..].find("</div>")?;
    let language = unescape_html_code(&head[start..start + end]);
    let language = language.trim();
    if language.is_empty() {
        None
    } else {
        Some(language.to_string())
    }
}

fn escape_html_code(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape_html_code(text: &str) -> String {
    const ENTITIES: [(&str, char); 5] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&#039;", '\''),
    ];

    let mut out = String::new();
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match ENTITIES
            .iter()
            .find(|(entity, _)| tail.starts_with(entity))
        {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &tail[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn strip_font_weight(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(pos) = rest.find("font-weight:") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + "font-weight:".len()..];
        let end = match tail.find(';') {
            Some(index) => index + 1,
            None => {
                rest = "";
                break;
            }
        };
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}
