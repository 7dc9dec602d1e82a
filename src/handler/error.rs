//! Request failure types
//!
//! Every way a request can fail short of a file being served. Each variant
//! knows its status code; the router turns it into an error page.

use hyper::{Method, StatusCode};
use thiserror::Error;

/// Errors that end a request with an error status.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Path could not be decoded (bad percent-encoding, invalid UTF-8, NUL byte).
    #[error("Bad request path: {0}")]
    BadRequest(String),

    /// Path would leave the served directory.
    #[error("Path escapes the served directory: {0}")]
    Forbidden(String),

    /// Nothing exists at the path.
    #[error("File not found: {0}")]
    NotFound(String),

    /// File exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Directory exists but could not be listed.
    #[error("No permission to list directory: {0}")]
    ListingDenied(String),

    /// Method other than GET, HEAD or OPTIONS.
    #[error("Unsupported method ('{0}')")]
    Unsupported(Method),
}

impl ServeError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::Unreadable { .. } | Self::ListingDenied(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }

    /// Message shown to the client; never includes filesystem details
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest(_) => "Bad request path".to_string(),
            Self::Forbidden(_) => "Path escapes the served directory".to_string(),
            Self::NotFound(_) | Self::Unreadable { .. } => "File not found".to_string(),
            Self::ListingDenied(_) => "No permission to list directory".to_string(),
            Self::Unsupported(_) => self.to_string(),
        }
    }
}
