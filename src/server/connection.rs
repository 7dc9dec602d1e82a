// Connection handling module
// Accepts a single TCP connection and serves it in its own task

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};

use super::stream::{HeaderGuardStream, ResponseLedger};
use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept and process a connection, checking the connection limit.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            // Exceeded limit: rollback counter and reject
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
    );
}

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `HeaderGuardStream` and `TokioIo`
/// 2. Configures HTTP/1.1 connection settings (keep-alive, header read timeout)
/// 3. Serves the connection with the request handler
/// 4. Logs connection-level failures (client gone mid-response, timeouts)
/// 5. Decrements connection counter when done
///
/// The stream is owned by the task and closed when it ends, whatever the outcome.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        // Heads hyper writes itself (unparseable requests) bypass the service
        let ledger = Arc::new(ResponseLedger::default());
        let io = TokioIo::new(HeaderGuardStream::new(
            stream,
            Arc::clone(&ledger),
            state.headers.wire_lines(),
        ));

        let performance = &state.config.performance;
        let mut builder = http1::Builder::new();
        builder
            .keep_alive(performance.keep_alive)
            .title_case_headers(true)
            .timer(TokioTimer::new())
            .header_read_timeout(Duration::from_secs(performance.header_read_timeout));

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&service_state);
                let ledger = Arc::clone(&ledger);
                async move {
                    let method = req.method().clone();
                    let response = handler::handle_request(req, state, peer_addr).await?;
                    ledger.record(&method, &response);
                    Ok::<_, Infallible>(response)
                }
            }),
        );

        if let Err(err) = conn.await {
            // A client closing the socket early is routine, not worth an error line
            if err.is_incomplete_message() || err.is_canceled() {
                logger::log_warning(&format!("Connection from {peer_addr} closed early: {err}"));
            } else {
                logger::log_connection_error(&err);
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestRoot;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Accept one connection on an ephemeral port and hand it to `accept_connection`
    async fn accept_one(
        state: &Arc<AppState>,
        counter: &Arc<AtomicUsize>,
    ) -> (TcpStream, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::clone(state);
        let counter = Arc::clone(counter);
        let server = tokio::spawn(async move {
            let (stream, peer) = listener.accept().await.unwrap();
            accept_connection(stream, peer, &state, &counter);
        });
        let client = TcpStream::connect(addr).await.unwrap();
        (client, server)
    }

    #[tokio::test]
    async fn test_connection_limit_rejects() {
        let root = TestRoot::new();
        let mut cfg = root.config();
        cfg.performance.max_connections = Some(1);
        let state = Arc::new(AppState::new(cfg).unwrap());
        // Pretend one connection is already being served
        let counter = Arc::new(AtomicUsize::new(1));

        let (mut client, server) = accept_one(&state, &counter).await;
        server.await.unwrap();

        client
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .ok();
        let mut buf = Vec::new();
        let read = client.read_to_end(&mut buf).await.unwrap_or(0);
        assert_eq!(read, 0, "rejected connection should be closed without a response");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_counter_released_after_close() {
        let root = TestRoot::new();
        root.write("a.txt", b"a");
        let state = root.state();
        let counter = Arc::new(AtomicUsize::new(0));

        let (mut client, server) = accept_one(&state, &counter).await;
        server.await.unwrap();
        client
            .write_all(b"GET /a.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).await.unwrap();
        assert!(String::from_utf8_lossy(&buf).starts_with("HTTP/1.1 200 OK"));

        for _ in 0..50 {
            if counter.load(Ordering::SeqCst) == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("connection counter never returned to zero");
    }
}
