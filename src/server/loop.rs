// Server loop module
// Accepts connections until the process is killed

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Accept loop: one spawned task per connection, runs until the process exits
///
/// Accept failures (e.g. out of file descriptors) are logged and the loop
/// keeps going; nothing a single connection does can end it.
pub async fn run_accept_loop(listener: TcpListener, state: Arc<AppState>) {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                accept_connection(stream, peer_addr, &state, &active_connections);
            }
            Err(e) => {
                logger::log_error(&format!("Failed to accept connection: {e}"));
            }
        }
    }
}
