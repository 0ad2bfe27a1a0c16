//! Preview server command.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::Router;
use tower_http::services::ServeDir;

use inlay_pipeline::SiteConfig;

/// Serve an already-built destination tree, no watching or reload.
pub async fn run(config_path: &Path, port: u16, dir: Option<PathBuf>) -> Result<()> {
    let config = SiteConfig::load(config_path)?;
    let dir = dir.unwrap_or(config.paths.dest);

    if !dir.exists() {
        anyhow::bail!(
            "Directory not found: {}. Run 'inlay build' first.",
            dir.display()
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.serve.host, port)
        .parse()
        .context("Invalid address")?;

    tracing::info!("Serving {} at http://{}", dir.display(), addr);

    let app = Router::new().fallback_service(ServeDir::new(&dir));

    let listener = tokio::net::TcpListener::bind(addr).await?;

    if config.serve.open {
        let url = format!("http://{}", addr);
        let _ = open::that(&url);
    }

    axum::serve(listener, app).await?;

    Ok(())
}
