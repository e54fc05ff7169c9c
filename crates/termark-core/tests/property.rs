use std::panic;

use termark_core::{escape_html, format_content, format_content_with_report};

const CASES: usize = 300;
const MAX_LEN: usize = 400;
const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCXYZ0123456789 \
\n\n\n\t#*`$[](){}!<>:/-_=.&\"'";

/// Fragments that make injection attempts more likely than uniform noise.
const TOKENS: &[&str] = &[
    "<script>",
    "</script>",
    "javascript:",
    "JavaScript:",
    "onerror=",
    "<img src=x onerror=alert(1)>",
    "[x](javascript:alert(1))",
    "![x](javascript:alert(1))",
    "[ok](https://example.com)",
    "![ok](/a.png)",
    "**",
    "`",
    "```",
    "\n- ",
    "\n*cap*\n",
    "\n# ",
    "\n$ ",
    "\"",
    "'",
];

#[test]
fn formatter_never_panics_on_random_input() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x5eed_0bad_c0de_1234);
    for case in 0..CASES {
        let source = random_source(&mut rng);
        let result = panic::catch_unwind(|| format_content_with_report(&source));
        if result.is_err() {
            return Err(format!("format_content panicked for case {}: {:?}", case, source).into());
        }
    }
    Ok(())
}

#[test]
fn no_injection_survives() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x0dd_ba11_cafe_f00d);
    for case in 0..CASES {
        let source = random_source(&mut rng);
        let html = format_content(&source);
        if let Err(message) = check_markup(&html) {
            return Err(format!(
                "case {}: {}\nSource:\n---\n{}\n---\nHTML:\n{}",
                case, message, source, html
            )
            .into());
        }
    }
    Ok(())
}

const TAGS: &[&str] = &[
    "a", "br", "code", "div", "h1", "h2", "h3", "h4", "i", "img", "li", "p", "pre", "span", "ul",
];
const ATTRIBUTES: &[&str] = &[
    "alt",
    "class",
    "data-image-alt",
    "data-image-src",
    "href",
    "rel",
    "src",
    "target",
];
const DANGEROUS: &[&str] = &["javascript:", "data:", "vbscript:", "file:", "about:"];

/// Text and attribute values are always escaped, so every raw `<` opens a tag
/// the formatter emitted itself.
fn check_markup(html: &str) -> Result<(), String> {
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        let end = rest[start..]
            .find('>')
            .map(|idx| start + idx)
            .ok_or_else(|| "unterminated tag".to_string())?;
        check_tag(&rest[start + 1..end])?;
        rest = &rest[end + 1..];
    }
    Ok(())
}

fn check_tag(tag: &str) -> Result<(), String> {
    if let Some(name) = tag.strip_prefix('/') {
        return check_name(name);
    }
    let tag = tag.strip_suffix('/').unwrap_or(tag).trim_end();
    let (name, mut attrs) = tag.split_once(' ').unwrap_or((tag, ""));
    check_name(name)?;
    loop {
        attrs = attrs.trim_start();
        if attrs.is_empty() {
            return Ok(());
        }
        let (attr, after) = attrs
            .split_once("=\"")
            .ok_or_else(|| format!("malformed attributes in <{}>", tag))?;
        let (value, after) = after
            .split_once('"')
            .ok_or_else(|| format!("unterminated attribute in <{}>", tag))?;
        if !ATTRIBUTES.contains(&attr) {
            return Err(format!("unexpected attribute {:?} in <{}>", attr, tag));
        }
        if matches!(attr, "href" | "src" | "data-image-src") {
            let lowered = value.trim().to_lowercase();
            if DANGEROUS.iter().any(|scheme| lowered.starts_with(scheme)) {
                return Err(format!("dangerous {} {:?}", attr, value));
            }
        }
        attrs = after;
    }
}

fn check_name(name: &str) -> Result<(), String> {
    if TAGS.contains(&name) {
        Ok(())
    } else {
        Err(format!("unexpected tag {:?}", name))
    }
}

#[test]
fn lists_and_wrappers_are_balanced() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x1234_5678_9abc_def0);
    for case in 0..CASES {
        let source = random_source(&mut rng);
        let html = format_content(&source);
        let ul_open = html.matches("<ul").count();
        let ul_close = html.matches("</ul>").count();
        let div_open = html.matches("<div").count();
        let div_close = html.matches("</div>").count();
        if ul_open != ul_close || div_open != div_close {
            return Err(format!(
                "case {} unbalanced: ul {}/{} div {}/{}\nSource:\n---\n{}\n---",
                case, ul_open, ul_close, div_open, div_close, source
            )
            .into());
        }
    }
    Ok(())
}

#[test]
fn formatting_is_deterministic() {
    let mut rng = Lcg::new(0xfeed_face_dead_beef);
    for _ in 0..50 {
        let source = random_source(&mut rng);
        assert_eq!(format_content(&source), format_content(&source));
    }
}

#[test]
fn escaper_output_has_no_raw_special_characters() {
    let mut rng = Lcg::new(0xabad_1dea_0000_0001);
    for _ in 0..CASES {
        let source = random_source(&mut rng);
        let escaped = escape_html(&source);
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('>'));
        assert!(!escaped.contains('"'));
        assert!(!escaped.contains('\''));
        // Every ampersand left must start one of the five entities.
        for (idx, _) in escaped.match_indices('&') {
            let rest = &escaped[idx..];
            assert!(
                ["&amp;", "&lt;", "&gt;", "&quot;", "&#039;"]
                    .iter()
                    .any(|entity| rest.starts_with(entity)),
                "bare ampersand in {:?}",
                escaped
            );
        }
    }
}

fn random_source(rng: &mut Lcg) -> String {
    let len = rng.gen_range(0, MAX_LEN + 1);
    let mut out = String::with_capacity(len);
    while out.len() < len {
        if rng.gen_range(0, 4) == 0 {
            let idx = rng.gen_range(0, TOKENS.len());
            out.push_str(TOKENS[idx]);
        } else {
            let idx = rng.gen_range(0, CHARSET.len());
            let byte = CHARSET.get(idx).copied().unwrap_or(b' ');
            out.push(byte as char);
        }
    }
    out
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn gen_range(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        let span = max - min;
        let value = (self.next() >> 1) as usize;
        min + (value % span)
    }
}
