//! Development server with live reload support.

mod path;
mod response;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use anyhow::Result;
use tiny_http::{Request, Server};

use crate::config::GantryConfig;
use crate::core::BuildMode;
use crate::registry::PathRegistry;
use crate::reload::ReloadHub;
use crate::task::TaskSet;
use crate::{debug, log};

pub use path::resolve_path;

/// URL at which the in-memory reload client script is served.
pub const RELOAD_JS_URL: &str = "/__gantry/reload.js";

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Actual WebSocket port (may differ from the configured port when it
/// was in use and the bind retried upward).
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(0);

fn ws_port() -> Option<u16> {
    match ACTUAL_WS_PORT.load(Ordering::Relaxed) {
        0 => None,
        port => Some(port),
    }
}

/// Run the dev server: bind HTTP, start the reload WebSocket server,
/// spawn the watch thread, then block on the request loop until
/// shutdown is requested.
pub fn run_dev(config: &GantryConfig) -> Result<()> {
    let (server, addr) = bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    crate::core::register_server(Arc::clone(&server));

    let registry = PathRegistry::new(config.root().to_path_buf());
    let tasks = TaskSet::new(BuildMode::DEVELOPMENT, registry)?;

    let hub = ReloadHub::new();
    let watch_handle = if config.serve.watch {
        let port = crate::reload::start_ws_server(config.serve.reload_port, hub.clone())?;
        ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
        debug!("reload"; "ws://localhost:{}", port);
        Some(crate::watch::spawn(tasks, hub.clone()))
    } else {
        None
    };

    crate::core::set_serving();
    log!("serve"; "http://{}", addr);

    let dist = config.root().join("dist");
    for request in server.incoming_requests() {
        if crate::core::is_shutdown() {
            let _ = response::respond_unavailable(request);
            break;
        }
        if let Err(e) = handle_request(request, &dist) {
            log!("serve"; "request error: {e}");
        }
    }

    hub.close_all();
    if let Some(handle) = watch_handle {
        wait_for_watch(handle);
    }
    log!("serve"; "stopped");
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, dist: &std::path::Path) -> Result<()> {
    // reload.js is served from memory, independent of the output tree
    if request.url().starts_with(RELOAD_JS_URL)
        && let Some(port) = ws_port()
    {
        return response::respond_reload_js(request, port);
    }

    if let Some(path) = path::resolve_path(request.url(), dist) {
        return response::respond_file(request, &path, ws_port());
    }

    response::respond_not_found(request)
}

/// Bind to the specified interface and port, with automatic port retry.
fn bind_with_retry(interface: std::net::IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < MAX_PORT_RETRIES => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    MAX_PORT_RETRIES,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

/// Wait for the watch thread to wind down (max 2 seconds).
fn wait_for_watch(handle: std::thread::JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
}
