//! Development server with live reload for inlay.
//!
//! Serves the destination tree over HTTP, pushes reload signals to
//! connected browsers over a WebSocket, and re-runs transform steps when
//! source files change.

pub mod reload;
pub mod server;
pub mod watcher;

pub use reload::{reload_client_script, ReloadHub, ReloadMessage};
pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchCoordinator};
