//! WebSocket-based live reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Messages pushed to connected browser clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Full page reload
    Reload,

    /// Connection established
    Connected,
}

/// Hub for broadcasting reload signals to all connected clients.
///
/// This is the only long-lived mutable state in the whole tool: the set of
/// connected sockets, held implicitly as broadcast subscribers.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    /// Create a new reload hub.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: ReloadMessage) {
        // Ignore send errors (no receivers)
        let _ = self.sender.send(msg);
    }

    /// Subscribe to reload messages.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    /// Number of currently connected clients.
    pub fn client_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// The client-side reload script, served at `/__reload.js` and referenced
/// by the snippet the dev pipeline injects into rendered pages.
///
/// The WebSocket URL is derived from `location`, so the script works on
/// whatever host and port the server was bound to.
pub fn reload_client_script() -> &'static str {
    r#"
(function() {
  'use strict';

  var protocol = location.protocol === 'https:' ? 'wss://' : 'ws://';
  var url = protocol + location.host + '/__reload';
  var reconnectAttempts = 0;
  var maxReconnectAttempts = 10;

  function connect() {
    var ws = new WebSocket(url);

    ws.onopen = function() {
      console.log('[inlay] connected');
      reconnectAttempts = 0;
    };

    ws.onmessage = function(event) {
      var msg = JSON.parse(event.data);

      switch (msg.type) {
        case 'reload':
          location.reload();
          break;

        case 'connected':
          console.log('[inlay] server acknowledged connection');
          break;
      }
    };

    ws.onclose = function() {
      console.log('[inlay] disconnected');
      if (reconnectAttempts < maxReconnectAttempts) {
        reconnectAttempts++;
        setTimeout(connect, 1000 * reconnectAttempts);
      }
    };

    ws.onerror = function(e) {
      console.error('[inlay] websocket error:', e);
    };
  }

  connect();
})();
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_broadcasts_messages() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        hub.send(ReloadMessage::Reload);

        match rx.try_recv() {
            Ok(ReloadMessage::Reload) => {}
            _ => panic!("Expected Reload message"),
        }
    }

    #[test]
    fn send_without_subscribers_is_harmless() {
        let hub = ReloadHub::new();
        hub.send(ReloadMessage::Reload);
        assert_eq!(hub.client_count(), 0);
    }

    #[test]
    fn serializes_messages() {
        let json = serde_json::to_string(&ReloadMessage::Reload).unwrap();
        assert!(json.contains("reload"));

        let json = serde_json::to_string(&ReloadMessage::Connected).unwrap();
        assert!(json.contains("connected"));
    }

    #[test]
    fn client_script_connects_to_reload_endpoint() {
        let script = reload_client_script();
        assert!(script.contains("/__reload"));
        assert!(script.contains("location.reload()"));
    }
}
