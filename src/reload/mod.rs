//! Live reload over WebSocket.
//!
//! The dev server pushes a reload message to every connected browser tab
//! whenever a watched rebuild succeeds. The browser side is a small
//! script injected into served HTML; it reconnects on socket loss.

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Client script served at `/__gantry/reload.js`. The `{{WS_PORT}}`
/// placeholder is substituted with the bound WebSocket port.
pub const RELOAD_JS: &str = r#"(function () {
  var retry = 1000;
  function connect() {
    var ws = new WebSocket("ws://" + location.hostname + ":{{WS_PORT}}");
    ws.onmessage = function (event) {
      var msg = JSON.parse(event.data);
      if (msg.type === "reload") {
        location.reload();
      }
    };
    ws.onclose = function () {
      setTimeout(connect, retry);
    };
  }
  connect();
})();
"#;

/// Messages sent to connected browsers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    Connected,
    Reload,
}

impl ReloadMessage {
    pub fn to_json(&self) -> String {
        // Serializing a fieldless tagged enum cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Shared set of connected live reload clients.
///
/// Cloning is cheap; all clones broadcast to the same client list.
#[derive(Clone, Default)]
pub struct ReloadHub {
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
}

impl ReloadHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    fn add_client(&self, stream: TcpStream) {
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                let hello = ReloadMessage::Connected.to_json();
                if let Err(e) = ws.send(Message::Text(hello.into())) {
                    crate::log!("reload"; "failed to greet client: {}", e);
                    return;
                }
                let mut clients = self.clients.lock();
                clients.push(ws);
                crate::debug!("reload"; "client connected (total: {})", clients.len());
            }
            Err(e) => {
                crate::log!("reload"; "handshake failed: {}", e);
            }
        }
    }

    /// Send a message to every client, dropping the ones that error.
    pub fn broadcast(&self, message: &ReloadMessage) {
        let payload = message.to_json();
        let mut clients = self.clients.lock();
        clients.retain_mut(|ws| match ws.send(Message::Text(payload.clone().into())) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("reload"; "dropping client: {}", e);
                false
            }
        });
    }

    /// Close every connection. Used on shutdown.
    pub fn close_all(&self) {
        let mut clients = self.clients.lock();
        for ws in clients.iter_mut() {
            let _ = ws.close(None);
        }
        clients.clear();
    }
}

/// Bind the WebSocket listener and spawn the acceptor thread.
///
/// Returns the actually bound port, which may differ from `base_port`
/// when it was already in use.
pub fn start_ws_server(base_port: u16, hub: ReloadHub) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    std::thread::spawn(move || {
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("reload"; "incoming connection: {}", addr);
                    let _ = stream.set_nonblocking(false);
                    hub.add_client(stream);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("reload"; "accept error: {}", e);
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
        }
    });

    Ok(actual_port)
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(format!("127.0.0.1:{}", port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
