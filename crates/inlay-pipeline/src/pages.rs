//! Page step: template rendering.
//!
//! Entry templates live in `src/html/pages`; includes and layouts resolve
//! against `src/html` and, secondarily, the images source directory (so a
//! page can inline an SVG fragment with a plain `{% include %}`).

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use minijinja::{context, Environment, ErrorKind};
use regex::Regex;

use crate::config::SiteConfig;
use crate::paths::ProjectPaths;
use crate::pipeline::{Mode, PipelineError, StepOutcome};

const RELOAD_SNIPPET: &str = r#"<script src="/__reload.js"></script>"#;

/// Render every top-level entry template to HTML in the destination root.
///
/// A page whose render fails (syntax error, missing include) is logged and
/// skipped; sibling pages in the same batch still produce output.
pub(crate) fn render_pages(
    config: &SiteConfig,
    paths: &ProjectPaths,
    mode: Mode,
) -> Result<StepOutcome, PipelineError> {
    let entries_dir = paths.page_entries_dir();
    if !entries_dir.exists() {
        return Ok(StepOutcome::default());
    }

    fs::create_dir_all(&paths.pages.dest).map_err(|e| PipelineError::Write(e.to_string()))?;

    let env = template_env(paths);

    let mut outcome = StepOutcome::default();

    let entries = fs::read_dir(&entries_dir).map_err(|e| PipelineError::Read(e.to_string()))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !matches!(ext, "njk" | "html") {
            continue;
        }

        let (Some(file_name), Some(stem)) = (
            path.file_name().and_then(|n| n.to_str()),
            path.file_stem().and_then(|s| s.to_str()),
        ) else {
            continue;
        };

        match render_one(&env, &format!("pages/{file_name}"), mode) {
            Ok(mut html) => {
                if mode.is_dev() {
                    html = inject_reload_snippet(&html);
                } else if config.build.minify_html {
                    html = collapse_whitespace(&html);
                }

                fs::write(paths.pages.dest.join(format!("{stem}.html")), html)
                    .map_err(|e| PipelineError::Write(e.to_string()))?;
                outcome.written += 1;
            }
            Err(e) => {
                tracing::warn!("skipping {}: {}", path.display(), e);
                outcome.skipped += 1;
            }
        }
    }

    Ok(outcome)
}

/// Build the template environment with the multi-root loader.
fn template_env(paths: &ProjectPaths) -> Environment<'static> {
    let roots = vec![paths.pages.source.clone(), paths.images.source.clone()];

    let mut env = Environment::new();
    env.set_loader(multi_root_loader(roots));
    env
}

/// A loader that resolves template names against an ordered list of roots.
///
/// The first root wins; names that try to escape a root are rejected.
fn multi_root_loader(
    roots: Vec<PathBuf>,
) -> impl Fn(&str) -> Result<Option<String>, minijinja::Error> + Send + Sync + 'static {
    move |name| {
        let unsafe_name = name
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == ".." || seg.contains('\\'));
        if unsafe_name {
            return Ok(None);
        }

        for root in &roots {
            let path = root.join(name);
            if path.is_file() {
                return match fs::read_to_string(&path) {
                    Ok(source) => Ok(Some(source)),
                    Err(e) => Err(minijinja::Error::new(
                        ErrorKind::InvalidOperation,
                        "failed to read template",
                    )
                    .with_source(e)),
                };
            }
        }

        Ok(None)
    }
}

fn render_one(
    env: &Environment<'_>,
    name: &str,
    mode: Mode,
) -> Result<String, PipelineError> {
    let template = env
        .get_template(name)
        .map_err(|e| PipelineError::Template(e.to_string()))?;

    template
        .render(context! { dev => mode.is_dev() })
        .map_err(|e| PipelineError::Template(e.to_string()))
}

/// Insert the live-reload client script tag just before `</body>`, or append
/// it when the page has no body close tag.
fn inject_reload_snippet(html: &str) -> String {
    static BODY_CLOSE: OnceLock<Regex> = OnceLock::new();
    let re = BODY_CLOSE.get_or_init(|| Regex::new(r"(?i)</body>").expect("valid regex"));

    match re.find(html) {
        Some(m) => format!(
            "{}{RELOAD_SNIPPET}\n{}",
            &html[..m.start()],
            &html[m.start()..]
        ),
        None => format!("{html}\n{RELOAD_SNIPPET}"),
    }
}

/// Whitespace-collapsing HTML minification. `<pre>` blocks are left intact.
fn collapse_whitespace(html: &str) -> String {
    static PRE_BLOCK: OnceLock<Regex> = OnceLock::new();
    let pre = PRE_BLOCK.get_or_init(|| Regex::new(r"(?is)<pre\b.*?</pre>").expect("valid regex"));

    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for m in pre.find_iter(html) {
        out.push_str(&collapse_segment(&html[last..m.start()]));
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&collapse_segment(&html[last..]));
    out
}

fn collapse_segment(segment: &str) -> String {
    static RUNS: OnceLock<Regex> = OnceLock::new();
    static BETWEEN_TAGS: OnceLock<Regex> = OnceLock::new();

    let runs = RUNS.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));
    let between = BETWEEN_TAGS.get_or_init(|| Regex::new(r">\s+<").expect("valid regex"));

    let collapsed = runs.replace_all(segment, " ");
    between.replace_all(&collapsed, "><").trim().to_string()
}
