//! Request handler module
//!
//! Responsible for request dispatch and static file serving: path resolution,
//! directory listings, and the error pages for everything that fails.

pub mod error;
pub mod listing;
pub mod resolve;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
