//! Production build command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use inlay_pipeline::{clean, pipeline, Mode, SiteConfig};

/// Run the build pipeline: clean, then all transforms in build mode.
pub async fn run(config_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let mut config = SiteConfig::load(config_path)?;
    if let Some(output) = output {
        config.paths.dest = output;
    }
    let paths = config.project_paths();

    clean::clean_dest(&paths).context("failed to clean destination")?;

    let summaries = {
        let config = config.clone();
        let paths = paths.clone();
        tokio::task::spawn_blocking(move || pipeline::run_all(&config, &paths, Mode::Build))
            .await
            .context("build panicked")??
    };

    let written: usize = summaries.iter().map(|s| s.written).sum();
    let skipped: usize = summaries.iter().map(|s| s.skipped).sum();
    let duration: u64 = summaries.iter().map(|s| s.duration_ms).max().unwrap_or(0);

    for summary in &summaries {
        tracing::info!(
            "{}: {} files in {}ms",
            summary.kind.label(),
            summary.written,
            summary.duration_ms
        );
    }

    if skipped > 0 {
        tracing::warn!("{} files skipped; see warnings above", skipped);
    }

    tracing::info!(
        "built {} files into {} in {}ms",
        written,
        paths.dest_root.display(),
        duration
    );

    Ok(())
}
