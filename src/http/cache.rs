//! HTTP cache validators module
//!
//! Provides `ETag` and `Last-Modified` generation and conditional request handling.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::SystemTime;

/// IMF-fixdate, the preferred HTTP date format (RFC 7231 §7.1.1.1)
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Obsolete date forms recipients must still accept: RFC 850 and asctime
const OBSOLETE_DATE_FORMATS: [&str; 2] = ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"];

/// Generate `ETag` using fast hashing
///
/// # Arguments
/// * `content` - File content
///
/// # Returns
/// Quoted `ETag` string, e.g., `"abc123def"`
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Wildcard: `*`
/// - Weak `ETags`: `W/"abc123"` (weak comparison, RFC 7232 §3.2)
///
/// # Returns
/// Returns true if matched (should return 304), false otherwise
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        // Handle multiple ETags separated by comma
        client_etag.split(',').map(str::trim).any(|e| {
            e == "*" || strip_weak(e) == strip_weak(etag)
        })
    })
}

fn strip_weak(etag: &str) -> &str {
    etag.strip_prefix("W/").unwrap_or(etag)
}

/// Format a timestamp as an HTTP date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn format_http_date(time: SystemTime) -> String {
    let time: DateTime<Utc> = time.into();
    time.format(HTTP_DATE_FORMAT).to_string()
}

/// Check `If-Modified-Since` against a file's modification time
///
/// Compared with second precision, since that is all an HTTP date carries.
/// A missing or unparseable header never matches.
pub fn check_not_modified_since(if_modified_since: Option<&str>, modified: SystemTime) -> bool {
    let Some(since) = if_modified_since.and_then(parse_http_date) else {
        return false;
    };
    let modified: DateTime<Utc> = modified.into();
    modified.timestamp() <= since
}

/// Parse any of the three HTTP date forms into a Unix timestamp
fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.timestamp());
    }
    // Both obsolete forms are always GMT
    OBSOLETE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|date| date.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    // Sun, 06 Nov 1994 08:49:37 GMT
    const RFC_EXAMPLE_SECS: u64 = 784_111_777;

    #[test]
    fn test_generate_etag() {
        let etag = generate_etag(b"hello world");
        assert!(etag.starts_with('"'));
        assert!(etag.ends_with('"'));
        assert!(etag.len() > 2);
    }

    #[test]
    fn test_etag_consistency() {
        let etag1 = generate_etag(b"same content");
        let etag2 = generate_etag(b"same content");
        assert_eq!(etag1, etag2);
    }

    #[test]
    fn test_etag_difference() {
        let etag1 = generate_etag(b"content a");
        let etag2 = generate_etag(b"content b");
        assert_ne!(etag1, etag2);
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"abc123\"";
        assert!(check_etag_match(Some("\"abc123\""), etag));
        assert!(check_etag_match(Some("\"xyz\", \"abc123\""), etag));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"different\""), etag));
        assert!(!check_etag_match(None, etag));
    }

    #[test]
    fn test_check_etag_match_weak() {
        let etag = "\"abc123\"";
        assert!(check_etag_match(Some("W/\"abc123\""), etag));
        assert!(check_etag_match(Some("W/\"xyz\", W/\"abc123\""), etag));
        assert!(!check_etag_match(Some("W/\"xyz\""), etag));
    }

    #[test]
    fn test_format_http_date() {
        let time = UNIX_EPOCH + Duration::from_secs(RFC_EXAMPLE_SECS);
        assert_eq!(format_http_date(time), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_not_modified_since() {
        let modified = UNIX_EPOCH + Duration::from_secs(RFC_EXAMPLE_SECS);
        let same = "Sun, 06 Nov 1994 08:49:37 GMT";
        let earlier = "Sun, 06 Nov 1994 08:49:36 GMT";
        let later = "Mon, 07 Nov 1994 08:49:37 GMT";

        assert!(check_not_modified_since(Some(same), modified));
        assert!(check_not_modified_since(Some(later), modified));
        assert!(!check_not_modified_since(Some(earlier), modified));
    }

    #[test]
    fn test_parse_all_date_forms() {
        let expected = i64::try_from(RFC_EXAMPLE_SECS).unwrap();
        for value in [
            "Sun, 06 Nov 1994 08:49:37 GMT",
            "Sunday, 06-Nov-94 08:49:37 GMT",
            "Sun Nov  6 08:49:37 1994",
        ] {
            assert_eq!(parse_http_date(value), Some(expected), "{value}");
        }
    }

    #[test]
    fn test_not_modified_since_obsolete_forms() {
        let modified = UNIX_EPOCH + Duration::from_secs(RFC_EXAMPLE_SECS);
        assert!(check_not_modified_since(
            Some("Sunday, 06-Nov-94 08:49:37 GMT"),
            modified
        ));
        assert!(check_not_modified_since(Some("Sun Nov  6 08:49:37 1994"), modified));
        assert!(!check_not_modified_since(Some("Sun Nov  6 08:49:36 1994"), modified));
    }

    #[test]
    fn test_not_modified_ignores_subsecond_mtime() {
        let modified = UNIX_EPOCH + Duration::from_millis(RFC_EXAMPLE_SECS * 1000 + 750);
        assert!(check_not_modified_since(
            Some("Sun, 06 Nov 1994 08:49:37 GMT"),
            modified
        ));
    }

    #[test]
    fn test_not_modified_invalid_header() {
        let modified = UNIX_EPOCH + Duration::from_secs(RFC_EXAMPLE_SECS);
        assert!(!check_not_modified_since(None, modified));
        assert!(!check_not_modified_since(Some("yesterday"), modified));
        assert!(!check_not_modified_since(Some(""), modified));
    }
}
