//! Request dispatch module
//!
//! Entry point for HTTP request processing: method validation, dispatch to the
//! static file handler, and response finalization (isolation headers, access log).

use crate::config::AppState;
use crate::handler::error::ServeError;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
#[derive(Debug)]
pub struct RequestContext<'a> {
    /// Raw (still percent-encoded) request path
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
    pub range_header: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    fn from_parts(req: &'a Parts) -> Self {
        let header = move |name: &str| req.headers.get(name).and_then(|v| v.to_str().ok());
        Self {
            path: req.uri.path(),
            query: req.uri.query(),
            is_head: req.method == Method::HEAD,
            if_none_match: header("if-none-match"),
            if_modified_since: header("if-modified-since"),
            range_header: header("range"),
        }
    }
}

/// Main entry point for HTTP request handling
///
/// Generic over the request body, which is dropped unread.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (req, _) = req.into_parts();

    let mut response = dispatch(&req, &state).await;
    finalize_response(&mut response, &state);

    if state.config.logging.access_log {
        log_access(&req, &response, peer_addr, started, &state);
    }
    Ok(response)
}

/// Response finalization hook, run on every response whatever its status
pub fn finalize_response(response: &mut Response<Full<Bytes>>, state: &AppState) {
    if !response.headers().contains_key(SERVER) {
        if let Ok(value) = HeaderValue::from_str(&state.config.http.server_name) {
            response.headers_mut().insert(SERVER, value);
        }
    }
    state.headers.apply(response);
}

async fn dispatch(req: &Parts, state: &AppState) -> Response<Full<Bytes>> {
    if let Some(resp) = check_http_method(&req.method) {
        return resp;
    }

    let ctx = RequestContext::from_parts(req);
    static_files::serve_path(&ctx, state).await
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
///
/// POST is advertised through CORS but has no handler, like every other
/// method beyond GET/HEAD/OPTIONS.
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not implemented: {method}"));
            Some(static_files::error_response(
                &ServeError::Unsupported(method.clone()),
                false,
            ))
        }
    }
}

fn log_access(
    req: &Parts,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let header = |name: &str| {
        req.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method.to_string(),
        req.uri.path().to_string(),
    );
    entry.query = req.uri.query().map(ToString::to_string);
    entry.http_version = version_label(req.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
