//! Request path resolution
//!
//! Maps a request path onto the root directory. Rejects anything that could
//! reach outside the root: `..` segments before touching the filesystem, and
//! symlinks by comparing canonical paths afterwards.

use crate::handler::error::ServeError;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use tokio::fs;

/// What a request path resolved to
#[derive(Debug, PartialEq, Eq)]
pub enum Resolved {
    /// Regular file, canonical path
    File(PathBuf),
    /// Directory without an index file
    Listing {
        dir: PathBuf,
        /// Decoded request path, for the page title
        display_path: String,
    },
    /// Directory requested without a trailing slash; target location
    Redirect(String),
}

/// Resolve `path` (still percent-encoded) below the canonical `root`
pub async fn resolve(
    root: &Path,
    path: &str,
    query: Option<&str>,
    index_files: &[String],
) -> Result<Resolved, ServeError> {
    let decoded = decode_path(path)?;
    let wants_dir = decoded.ends_with('/');

    let mut target = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(ServeError::Forbidden(path.to_string())),
            s => target.push(s),
        }
    }

    let canonical = canonicalize_within(root, &target, path).await?;
    let metadata = fs::metadata(&canonical)
        .await
        .map_err(|_| ServeError::NotFound(path.to_string()))?;

    if metadata.is_dir() {
        if !wants_dir {
            // "//host" in a Location header names another host
            let local = path.trim_start_matches('/');
            let location = match query {
                Some(q) => format!("/{local}/?{q}"),
                None => format!("/{local}/"),
            };
            return Ok(Resolved::Redirect(location));
        }

        for index in index_files {
            let candidate = canonical.join(index);
            if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
                let file = canonicalize_within(root, &candidate, path).await?;
                return Ok(Resolved::File(file));
            }
        }

        return Ok(Resolved::Listing {
            dir: canonical,
            display_path: decoded,
        });
    }

    // "file.txt/" names a directory that does not exist
    if wants_dir {
        return Err(ServeError::NotFound(path.to_string()));
    }

    Ok(Resolved::File(canonical))
}

/// Percent-decode a request path, rejecting invalid UTF-8 and NUL bytes
fn decode_path(path: &str) -> Result<String, ServeError> {
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| ServeError::BadRequest(path.to_string()))?;
    if decoded.contains('\0') {
        return Err(ServeError::BadRequest(path.to_string()));
    }
    Ok(decoded.into_owned())
}

/// Canonicalize `target` and make sure it is still below `root`
async fn canonicalize_within(
    root: &Path,
    target: &Path,
    request_path: &str,
) -> Result<PathBuf, ServeError> {
    let canonical = fs::canonicalize(target)
        .await
        .map_err(|_| ServeError::NotFound(request_path.to_string()))?;
    if !canonical.starts_with(root) {
        return Err(ServeError::Forbidden(request_path.to_string()));
    }
    Ok(canonical)
}
