//! Development pipeline command: clean, build everything, serve, watch.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use inlay_pipeline::{clean, pipeline, Mode, SiteConfig};
use inlay_server::{DevServer, DevServerConfig, ReloadHub, WatchCoordinator};

/// Run the dev pipeline. Never returns under normal operation; the process
/// terminates on interruption.
pub async fn run(config_path: &Path, port: Option<u16>, open: bool) -> Result<()> {
    let config = SiteConfig::load(config_path)?;
    let paths = config.project_paths();

    // The destination must be gone before any transform writes into it.
    clean::clean_dest(&paths).context("failed to clean destination")?;

    let summaries = {
        let config = config.clone();
        let paths = paths.clone();
        tokio::task::spawn_blocking(move || pipeline::run_all(&config, &paths, Mode::Dev))
            .await
            .context("initial build panicked")??
    };

    for summary in &summaries {
        tracing::info!(
            "{}: {} files in {}ms",
            summary.kind.label(),
            summary.written,
            summary.duration_ms
        );
    }

    let hub = ReloadHub::new();

    let _coordinator = WatchCoordinator::spawn(
        Arc::new(config.clone()),
        Arc::new(paths.clone()),
        hub.clone(),
    )
    .context("failed to start file watcher")?;

    tracing::info!("watching {} for changes", paths.source_root.display());

    let server_config = DevServerConfig {
        root: paths.dest_root.clone(),
        host: config.serve.host.clone(),
        port: port.unwrap_or(config.serve.port),
        open: open || config.serve.open,
    };

    DevServer::new(server_config, hub).start().await?;

    Ok(())
}
