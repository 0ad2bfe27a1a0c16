//! Pipeline composer: runs the transform steps and reports summaries.

use std::time::Instant;

use rayon::prelude::*;

use crate::config::SiteConfig;
use crate::paths::{AssetKind, ProjectPaths};
use crate::{fonts, images, pages, scripts, styles};

/// Errors that can abort a step or the whole pipeline.
///
/// Per-file failures inside a step are logged and skipped rather than
/// surfaced here; these variants cover the failures that make a step's
/// output unusable as a whole.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to load config: {0}")]
    Config(String),

    #[error("failed to clean {path}: {message}")]
    Clean { path: String, message: String },

    #[error("failed to read source: {0}")]
    Read(String),

    #[error("failed to write output: {0}")]
    Write(String),

    #[error("stylesheet error: {0}")]
    Css(String),

    #[error("script error: {0}")]
    Js(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("image error: {0}")]
    Image(String),
}

/// Which pipeline variant is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Development: live-reload snippet injected, HTML left readable.
    Dev,

    /// Production: HTML minified, no reload snippet.
    Build,
}

impl Mode {
    pub fn is_dev(&self) -> bool {
        matches!(self, Mode::Dev)
    }
}

/// Counts produced by one step run. Files that failed and were skipped are
/// tracked separately so watch-mode logs show degradation.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct StepOutcome {
    pub written: usize,
    pub skipped: usize,
}

/// Result of running a single transform step.
#[derive(Debug)]
pub struct StepSummary {
    pub kind: AssetKind,
    pub written: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

/// Run one category's transform step to completion.
///
/// Steps re-read their inputs from disk on every invocation and hold no
/// state between runs.
pub fn run_step(
    kind: AssetKind,
    config: &SiteConfig,
    paths: &ProjectPaths,
    mode: Mode,
) -> Result<StepSummary, PipelineError> {
    let start = Instant::now();

    let outcome = match kind {
        AssetKind::Styles => styles::compile_styles(config, paths),
        AssetKind::Scripts => scripts::minify_scripts(paths),
        AssetKind::Pages => pages::render_pages(config, paths, mode),
        AssetKind::Images => images::optimize_images(config, paths),
        AssetKind::Fonts => fonts::copy_fonts(paths),
    }?;

    let summary = StepSummary {
        kind,
        written: outcome.written,
        skipped: outcome.skipped,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    tracing::debug!(
        "{}: {} written, {} skipped in {}ms",
        kind.label(),
        summary.written,
        summary.skipped,
        summary.duration_ms
    );

    Ok(summary)
}

/// Run all five transform steps concurrently and wait for every one.
///
/// The steps write to disjoint destination subtrees, so no ordering between
/// them is required. The caller must have completed the clean step first.
pub fn run_all(
    config: &SiteConfig,
    paths: &ProjectPaths,
    mode: Mode,
) -> Result<Vec<StepSummary>, PipelineError> {
    AssetKind::ALL
        .par_iter()
        .map(|kind| run_step(*kind, config, paths, mode))
        .collect()
}
