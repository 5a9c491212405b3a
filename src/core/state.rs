//! Process state tracking for serve mode.
//!
//! Two orthogonal states:
//! - `SERVING`: Has the dev server entered its serving state?
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Dev server has entered the serving state
static SERVING: AtomicBool = AtomicBool::new(false);

/// Shutdown has been requested (Ctrl+C received or fatal watch error)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Check if the dev server is serving.
pub fn is_serving() -> bool {
    SERVING.load(Ordering::SeqCst)
}

/// Mark the dev server as serving (the one-way `Idle -> Serving` transition).
pub fn set_serving() {
    SERVING.store(true, Ordering::SeqCst);
}

/// Check if shutdown has been requested.
///
/// Relaxed ordering: worst case is handling one more change event
/// before stopping, which is acceptable.
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Request shutdown programmatically (fatal watch error, test teardown).
///
/// Unblocks the HTTP request loop if a server is registered.
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::SeqCst);
    if let Some(server) = SERVER.get() {
        server.unblock();
    }
}

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// Before `register_server()` the handler exits the process directly;
/// after it, the handler unblocks the request loop so serve mode can
/// tear down in order.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(server) = SERVER.get() {
            crate::log!("serve"; "shutting down...");
            server.unblock();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server for graceful shutdown.
///
/// Call after binding the server, before entering the request loop.
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}
