use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use termark_core::{Diagnostic, format_content_with_report, sanitize_html};
use termark_posts::utils::{estimate_read_time, format_date};
use termark_posts::{DEFAULT_PER_PAGE, PostRepository, paginate, search_posts};
use termark_renderer::{Renderer, Theme};

const LOG_ENV: &str = "TERMARK_LOG";
const DEFAULT_TITLE: &str = "termark";

#[derive(Parser)]
#[command(name = "termark")]
#[command(about = "Render terminal-styled blog posts to HTML")]
#[command(version)]
struct Cli {
    /// Markdown file to render; stdin is read when omitted
    input: Option<PathBuf>,

    /// Directory of `<slug>.md` posts with YAML frontmatter
    #[arg(long, env = "TERMARK_POSTS_DIR")]
    posts: Option<PathBuf>,

    /// Render the post with this slug from the posts directory
    #[arg(long, conflicts_with = "input")]
    slug: Option<String>,

    /// List posts, newest first, instead of rendering
    #[arg(long, conflicts_with_all = ["input", "slug"])]
    list: bool,

    /// Only list posts whose title, description or tags contain this text
    #[arg(long)]
    search: Option<String>,

    /// Page of the listing to print, starting at 1
    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    per_page: usize,

    /// Re-parse the output through the HTML allow-list
    #[arg(long)]
    sanitized: bool,

    /// Syntax highlight fenced code blocks
    #[arg(long)]
    highlight: bool,

    /// Wrap the fragment in a full HTML document with inline CSS and JS
    #[arg(long)]
    standalone: bool,

    #[arg(long, value_enum, env = "TERMARK_THEME", default_value_t = ThemeArg::Auto)]
    theme: ThemeArg,

    /// Report dropped or discarded elements on stderr
    #[arg(long, value_enum)]
    diagnostics: Option<DiagnosticsMode>,

    /// Exit with status 1 when any diagnostic was reported
    #[arg(long)]
    strict: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ThemeArg {
    Auto,
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Auto => Theme::Auto,
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DiagnosticsMode {
    Json,
    Pretty,
}

/// Markdown to render plus the title used for standalone pages.
struct Document {
    title: String,
    source: String,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list {
        list_posts(&cli)?;
        return Ok(ExitCode::SUCCESS);
    }

    let document = load_document(&cli)?;
    let report = format_content_with_report(&document.source);
    debug!(
        bytes = report.html.len(),
        diagnostics = report.diagnostics.len(),
        "formatted content"
    );

    if let Some(mode) = cli.diagnostics {
        emit_diagnostics(&report.diagnostics, mode)?;
    }

    // Sanitize before highlighting; the allow-list would strip syntect's
    // inline styles.
    let mut html = if cli.sanitized {
        sanitize_html(&report.html)
    } else {
        report.html
    };

    let renderer = Renderer::new(cli.theme.into());
    if cli.highlight {
        html = renderer.highlight_html(&html);
    }
    if cli.standalone {
        html = renderer.embed_html(&html, &document.title, true, true);
    }

    print!("{}", html);

    if cli.strict && !report.diagnostics.is_empty() {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn load_document(cli: &Cli) -> Result<Document> {
    if let Some(slug) = &cli.slug {
        let repo = repository(cli)?;
        let post = repo
            .post_by_slug(slug)
            .with_context(|| format!("failed to load post {:?}", slug))?;
        info!(slug = %post.slug, "rendering post");
        let title = if post.title.is_empty() {
            post.slug
        } else {
            post.title
        };
        return Ok(Document {
            title,
            source: post.content,
        });
    }

    match &cli.input {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(Document {
                title: file_title(path),
                source,
            })
        }
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read stdin")?;
            Ok(Document {
                title: DEFAULT_TITLE.to_string(),
                source,
            })
        }
    }
}

fn file_title(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(DEFAULT_TITLE)
        .to_string()
}

fn repository(cli: &Cli) -> Result<PostRepository> {
    match &cli.posts {
        Some(dir) => Ok(PostRepository::new(dir)),
        None => bail!("no posts directory; pass --posts or set TERMARK_POSTS_DIR"),
    }
}

fn list_posts(cli: &Cli) -> Result<()> {
    let repo = repository(cli)?;
    let posts = repo
        .all_posts()
        .with_context(|| format!("failed to list posts in {}", repo.dir().display()))?;
    let hits = search_posts(&posts, cli.search.as_deref().unwrap_or(""));
    let page = paginate(&hits, cli.page, cli.per_page);

    for post in &page.items {
        println!(
            "{}  {}  {} ({} min read)",
            format_date(&post.date),
            post.slug,
            post.title,
            estimate_read_time(&post.content)
        );
    }
    println!(
        "page {} of {} ({} posts)",
        page.page,
        page.total_pages.max(1),
        page.total_items
    );
    Ok(())
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    code: &'a str,
    severity: &'a str,
    message: &'a str,
    line: usize,
}

fn emit_diagnostics(diagnostics: &[Diagnostic], mode: DiagnosticsMode) -> Result<()> {
    match mode {
        DiagnosticsMode::Json => {
            let entries: Vec<JsonDiagnostic<'_>> = diagnostics
                .iter()
                .map(|diag| JsonDiagnostic {
                    code: diag.code,
                    severity: diag.severity.as_str(),
                    message: &diag.message,
                    line: diag.line,
                })
                .collect();
            eprintln!("{}", serde_json::to_string_pretty(&entries)?);
        }
        DiagnosticsMode::Pretty => {
            for diag in diagnostics {
                eprintln!(
                    "{}: {} {} {}",
                    diag.line + 1,
                    diag.severity.as_str(),
                    diag.code,
                    diag.message
                );
            }
        }
    }
    Ok(())
}
