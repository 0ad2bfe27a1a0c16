//! File watching and the watch coordinator.
//!
//! One recursive watcher covers the whole source tree; events are
//! classified into asset categories and fed to a per-category task that
//! debounces bursts, re-runs that category's transform, and signals a
//! browser reload.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

use inlay_pipeline::{run_step, AssetKind, Mode, ProjectPaths, SiteConfig};

use crate::reload::{ReloadHub, ReloadMessage};

/// Quiet window before a category's transform re-runs. Events landing
/// inside the window extend it (trailing-edge debounce).
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Watches the source tree and emits classified change events.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher over the project's source root.
    ///
    /// Returns the watcher and a channel of `(category, path)` events.
    /// Files no category covers produce no events.
    pub fn new(
        paths: &ProjectPaths,
    ) -> Result<(Self, async_mpsc::Receiver<(AssetKind, PathBuf)>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(256);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        if paths.source_root.exists() {
            watcher
                .watch(&paths.source_root, RecursiveMode::Recursive)
                .map_err(std::io::Error::other)?;
        }

        // Forward classified events onto the async channel.
        let paths = paths.clone();
        std::thread::spawn(move || {
            while let Ok(event) = sync_rx.recv() {
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    continue;
                }

                for path in event.paths {
                    if let Some(kind) = AssetKind::classify(&path, &paths) {
                        let _ = async_tx.blocking_send((kind, path));
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Maps change events to transform re-runs, one run at a time per category.
pub struct WatchCoordinator {
    _watcher: FileWatcher,
}

impl WatchCoordinator {
    /// Start watching. Spawns one driver task per category plus a dispatch
    /// task; all stay alive as long as the returned coordinator does.
    pub fn spawn(
        config: Arc<SiteConfig>,
        paths: Arc<ProjectPaths>,
        hub: ReloadHub,
    ) -> Result<Self, std::io::Error> {
        let (watcher, mut rx) = FileWatcher::new(&paths)?;

        let mut triggers: HashMap<AssetKind, async_mpsc::Sender<PathBuf>> = HashMap::new();
        for kind in AssetKind::ALL {
            let (tx, trigger_rx) = async_mpsc::channel(64);
            triggers.insert(kind, tx);
            tokio::spawn(category_loop(
                kind,
                trigger_rx,
                Arc::clone(&config),
                Arc::clone(&paths),
                hub.clone(),
            ));
        }

        tokio::spawn(async move {
            while let Some((kind, path)) = rx.recv().await {
                if let Some(tx) = triggers.get(&kind) {
                    // A full trigger queue already guarantees a re-run;
                    // dropping the extra event keeps dispatch non-blocking.
                    let _ = tx.try_send(path);
                }
            }
        });

        Ok(Self { _watcher: watcher })
    }
}

/// Drive one category: debounce triggers, run the transform to completion,
/// signal a reload, repeat. Triggers arriving mid-run queue up and coalesce
/// into a single follow-up run, so runs on one category never overlap.
async fn category_loop(
    kind: AssetKind,
    mut rx: async_mpsc::Receiver<PathBuf>,
    config: Arc<SiteConfig>,
    paths: Arc<ProjectPaths>,
    hub: ReloadHub,
) {
    while let Some(path) = rx.recv().await {
        tracing::debug!("{} changed: {}", kind.label(), path.display());

        // Trailing-edge debounce: wait for a quiet window, swallowing
        // every further trigger that lands inside it.
        loop {
            match tokio::time::timeout(DEBOUNCE, rx.recv()).await {
                Ok(Some(_)) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        let config = Arc::clone(&config);
        let paths = Arc::clone(&paths);
        let result =
            tokio::task::spawn_blocking(move || run_step(kind, &config, &paths, Mode::Dev)).await;

        match result {
            Ok(Ok(summary)) => {
                tracing::info!(
                    "{}: rebuilt {} files in {}ms",
                    kind.label(),
                    summary.written,
                    summary.duration_ms
                );
                hub.send(ReloadMessage::Reload);
            }
            Ok(Err(e)) => {
                tracing::warn!("{} re-run failed: {}", kind.label(), e);
            }
            Err(e) => {
                tracing::warn!("{} re-run panicked: {}", kind.label(), e);
            }
        }
    }
}
