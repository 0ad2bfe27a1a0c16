//! Development server implementation.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::services::ServeDir;

use crate::reload::{reload_client_script, ReloadHub, ReloadMessage};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Directory served as the site root (the destination tree)
    pub root: PathBuf,

    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Open a browser tab on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("dist"),
            host: "127.0.0.1".to_string(),
            port: 3000,
            open: false,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}: {1}")]
    InvalidAddress(String, String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),
}

/// Development server: static files from the destination root plus the
/// live-reload WebSocket endpoint.
pub struct DevServer {
    config: DevServerConfig,
    hub: ReloadHub,
}

impl DevServer {
    /// Create a new development server around an existing reload hub.
    pub fn new(config: DevServerConfig, hub: ReloadHub) -> Self {
        Self { config, hub }
    }

    /// Start serving. Never returns under normal operation.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr_str = format!("{}:{}", self.config.host, self.config.port);
        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e: std::net::AddrParseError| {
                ServerError::InvalidAddress(addr_str.clone(), e.to_string())
            })?;

        let app = Router::new()
            .route("/__reload", get(ws_handler))
            .route("/__reload.js", get(script_handler))
            .fallback_service(ServeDir::new(&self.config.root))
            .with_state(self.hub);

        tracing::info!(
            "serving {} at http://{}",
            self.config.root.display(),
            addr
        );

        if self.config.open {
            let url = format!("http://{}", addr);
            let _ = open::that(&url);
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

/// Handler for the reload WebSocket endpoint.
async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<ReloadHub>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, hub))
}

/// Handle a WebSocket connection: acknowledge, then forward reload signals.
async fn handle_ws(mut socket: WebSocket, hub: ReloadHub) {
    let mut rx = hub.subscribe();

    let Ok(msg) = serde_json::to_string(&ReloadMessage::Connected) else {
        return;
    };
    if socket.send(Message::Text(msg.into())).await.is_err() {
        return;
    }

    while let Ok(reload_msg) = rx.recv().await {
        let Ok(json) = serde_json::to_string(&reload_msg) else {
            continue;
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}

/// Handler for the reload client script.
async fn script_handler() -> impl IntoResponse {
    (
        [("content-type", "application/javascript")],
        reload_client_script(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_server_with_default_config() {
        let config = DevServerConfig::default();
        let server = DevServer::new(config, ReloadHub::new());

        assert_eq!(server.config.port, 3000);
        assert_eq!(server.config.host, "127.0.0.1");
        assert!(!server.config.open);
    }

    #[test]
    fn rejects_invalid_address() {
        let config = DevServerConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        let server = DevServer::new(config, ReloadHub::new());

        let err = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(server.start());

        assert!(matches!(err, Err(ServerError::InvalidAddress(_, _))));
    }
}
