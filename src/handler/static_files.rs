//! Static file serving module
//!
//! Handles static file loading, MIME type detection, and response building.

use crate::config::AppState;
use crate::handler::error::ServeError;
use crate::handler::listing;
use crate::handler::resolve::{self, Resolved};
use crate::handler::router::RequestContext;
use crate::http::response::{self as builders, Validators};
use crate::http::{self, cache, mime, range::RangeParseResult};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// Serve whatever the request path resolves to below the root directory
pub async fn serve_path(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let resolved = resolve::resolve(
        &state.root,
        ctx.path,
        ctx.query,
        &state.config.http.index_files,
    )
    .await;

    let result = match resolved {
        Ok(Resolved::File(file)) => serve_file(ctx, &file).await,
        Ok(Resolved::Listing { dir, display_path }) => {
            serve_listing(ctx, &dir, &display_path).await
        }
        Ok(Resolved::Redirect(location)) => Ok(http::build_redirect_response(&location)),
        Err(e) => Err(e),
    };

    result.unwrap_or_else(|e| error_response(&e, ctx.is_head))
}

/// Turn a failure into its error page, logging the ones worth a look
pub fn error_response(error: &ServeError, is_head: bool) -> Response<Full<Bytes>> {
    match error {
        ServeError::Forbidden(_) => {
            logger::log_warning(&format!("Path traversal attempt blocked: {error}"));
        }
        ServeError::Unreadable { .. } | ServeError::ListingDenied(_) => {
            logger::log_error(&error.to_string());
        }
        _ => {}
    }
    http::build_error_response(error.status(), &error.public_message(), is_head)
}

async fn serve_file(
    ctx: &RequestContext<'_>,
    file: &Path,
) -> Result<Response<Full<Bytes>>, ServeError> {
    let unreadable = |source| ServeError::Unreadable {
        path: ctx.path.to_string(),
        source,
    };

    let metadata = fs::metadata(file).await.map_err(unreadable)?;
    // Whole file in memory, HEAD and ranges included: the ETag hashes the content
    // and ranges are slices of it
    let content = fs::read(file).await.map_err(unreadable)?;

    let etag = cache::generate_etag(&content);
    let last_modified = metadata
        .modified()
        .map(cache::format_http_date)
        .unwrap_or_default();
    let validators = Validators {
        etag: &etag,
        last_modified: &last_modified,
    };

    // If-None-Match takes precedence; If-Modified-Since only applies without it
    let not_modified = if ctx.if_none_match.is_some() {
        cache::check_etag_match(ctx.if_none_match, &etag)
    } else {
        metadata
            .modified()
            .is_ok_and(|m| cache::check_not_modified_since(ctx.if_modified_since, m))
    };
    if not_modified {
        return Ok(http::build_304_response(&validators));
    }

    Ok(build_static_file_response(
        Bytes::from(content),
        mime::content_type_for(file),
        &validators,
        ctx.is_head,
        ctx.range_header,
    ))
}

async fn serve_listing(
    ctx: &RequestContext<'_>,
    dir: &Path,
    display_path: &str,
) -> Result<Response<Full<Bytes>>, ServeError> {
    let page = listing::render_listing(dir, display_path)
        .await
        .map_err(|_| ServeError::ListingDenied(ctx.path.to_string()))?;
    Ok(http::build_html_response(page, ctx.is_head))
}

/// Build static file response with Range support
fn build_static_file_response(
    data: Bytes,
    content_type: &str,
    validators: &Validators<'_>,
    is_head: bool,
    range_header: Option<&str>,
) -> Response<Full<Bytes>> {
    let total_size = data.len();

    match http::parse_range_header(range_header, total_size) {
        RangeParseResult::Valid(range) => {
            let (start, end) = range.bounds(total_size);
            let body = if is_head {
                Bytes::new()
            } else {
                data.slice(start..=end)
            };

            builders::build_partial_response(
                body,
                content_type,
                validators,
                start,
                end,
                total_size,
                is_head,
            )
        }
        RangeParseResult::NotSatisfiable => http::build_416_response(total_size),
        // No Range header or malformed, return full content
        RangeParseResult::None => {
            builders::build_file_response(data, content_type, validators, is_head)
        }
    }
}
