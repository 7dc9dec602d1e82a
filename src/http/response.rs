//! HTTP response building module
//!
//! Provides builders for various HTTP status code responses, decoupled from specific business logic.
//! None of these attach the isolation headers; that happens once, when the response is finalized.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// Methods the server answers with content
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Validators sent with file responses
#[derive(Debug, Clone)]
pub struct Validators<'a> {
    pub etag: &'a str,
    pub last_modified: &'a str,
}

/// Build 304 Not Modified response
pub fn build_304_response(validators: &Validators<'_>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(304)
        .header("ETag", validators.etag)
        .header("Last-Modified", validators.last_modified)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build an error response with a small HTML explanation page
///
/// `HEAD` requests get the same status and headers without the page.
pub fn build_error_response(
    status: StatusCode,
    message: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let page = error_page(status, message);
    let content_length = page.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(page)
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = status;
            response
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(204)
        .header("Allow", ALLOWED_METHODS)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: usize) -> Response<Full<Bytes>> {
    Response::builder()
        .status(416)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{file_size}"))
        .body(Full::new(Bytes::from("Range Not Satisfiable")))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(Full::new(Bytes::from("Range Not Satisfiable")))
        })
}

/// Build 301 redirect response
pub fn build_redirect_response(target: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(301)
        .header("Location", target)
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build full file response with validators
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    validators: &Validators<'_>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Accept-Ranges", "bytes")
        .header("ETag", validators.etag)
        .header("Last-Modified", validators.last_modified)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 206 Partial Content response
pub fn build_partial_response(
    data: Bytes,
    content_type: &str,
    validators: &Validators<'_>,
    start: usize,
    end: usize,
    total_size: usize,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = end - start + 1;
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(206)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Content-Range", format!("bytes {start}-{end}/{total_size}"))
        .header("Accept-Ranges", "bytes")
        .header("ETag", validators.etag)
        .header("Last-Modified", validators.last_modified)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Escape text for inclusion in HTML content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn error_page(status: StatusCode, message: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{code} {reason}</title>
</head>
<body>
<h1>{code} {reason}</h1>
<p>{message}</p>
</body>
</html>
"#,
        code = status.as_u16(),
        message = escape_html(message),
    )
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
