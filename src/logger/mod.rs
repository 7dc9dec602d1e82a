//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - The startup line on stdout
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::{AppState, Config};
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => eprintln!("{message}"),
    }
}

/// Announce the bound port on stdout, the only line the server prints there
pub fn log_server_start(addr: &SocketAddr, state: &AppState) {
    println!("Serving on port {}...", addr.port());

    write_error(&format!("[INFO] Listening on http://{addr}"));
    write_error(&format!("[INFO] Root directory: {}", state.root.display()));
    for (name, value) in state.headers.iter() {
        write_error(&format!(
            "[INFO] Adding header {}: {}",
            name,
            value.to_str().unwrap_or_default()
        ));
    }
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    write_error(&format!("[ERROR] Failed to serve connection: {err}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_info(message: &str) {
    write_error(&format!("[INFO] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}
