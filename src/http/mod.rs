//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from file serving:
//! response builders, MIME detection, validators, byte ranges, and the
//! cross-origin isolation header set.

pub mod cache;
pub mod isolation;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use isolation::IsolationHeaders;
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_416_response, build_error_response, build_html_response,
    build_options_response, build_redirect_response,
};
