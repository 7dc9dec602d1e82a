//! Cross-origin isolation headers
//!
//! The fixed header set attached to every response the server sends,
//! whatever its status. `COOP` + `COEP` make the page cross-origin isolated
//! (required for `SharedArrayBuffer` and precise timers), the `Access-Control-*`
//! headers let any origin read the files.

use hyper::header::{HeaderName, HeaderValue};
use hyper::Response;

/// Header names and values, in emission order
const ISOLATION_HEADERS: [(&str, &str); 5] = [
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-embedder-policy", "require-corp"),
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, POST, OPTIONS"),
    ("access-control-allow-headers", "*"),
];

/// Ordered, immutable set of headers applied to every outgoing response
#[derive(Debug, Clone)]
pub struct IsolationHeaders {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl IsolationHeaders {
    /// Attach every header to `response`.
    ///
    /// Uses `insert`, so a value produced earlier by a handler is replaced and
    /// each header appears exactly once.
    pub fn apply<B>(&self, response: &mut Response<B>) {
        let headers = response.headers_mut();
        for (name, value) in &self.entries {
            headers.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries.iter().map(|(name, value)| (name, value))
    }

    /// The set as raw `Name: value\r\n` lines, title-cased like the rest of the head
    ///
    /// Used where a response head is patched on the wire instead of built
    /// through `apply`.
    pub fn wire_lines(&self) -> Vec<u8> {
        let mut lines = Vec::new();
        for (name, value) in &self.entries {
            lines.extend_from_slice(title_case(name.as_str()).as_bytes());
            lines.extend_from_slice(b": ");
            lines.extend_from_slice(value.as_bytes());
            lines.extend_from_slice(b"\r\n");
        }
        lines
    }
}

/// `cross-origin-opener-policy` -> `Cross-Origin-Opener-Policy`
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        out.push(if upper { c.to_ascii_uppercase() } else { c });
        upper = c == '-';
    }
    out
}

impl Default for IsolationHeaders {
    fn default() -> Self {
        Self {
            entries: ISOLATION_HEADERS
                .into_iter()
                .map(|(name, value)| {
                    (
                        HeaderName::from_static(name),
                        HeaderValue::from_static(value),
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::assert_isolation_headers;

    #[test]
    fn test_default_order() {
        let headers = IsolationHeaders::default();
        let names: Vec<&str> = headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "cross-origin-opener-policy",
                "cross-origin-embedder-policy",
                "access-control-allow-origin",
                "access-control-allow-methods",
                "access-control-allow-headers",
            ]
        );
        assert_eq!(headers.iter().count(), 5);
    }

    #[test]
    fn test_apply_to_empty_response() {
        let mut response = Response::new(());
        IsolationHeaders::default().apply(&mut response);
        assert_isolation_headers(&response);
        assert_eq!(response.headers().len(), 5);
    }

    #[test]
    fn test_apply_keeps_other_headers() {
        let mut response = Response::builder()
            .status(404)
            .header("Content-Type", "text/html")
            .body(())
            .unwrap();
        IsolationHeaders::default().apply(&mut response);
        assert_isolation_headers(&response);
        assert_eq!(response.headers()["content-type"], "text/html");
        assert_eq!(response.status(), 404);
    }

    #[test]
    fn test_apply_replaces_existing_values() {
        let mut response = Response::builder()
            .header("Access-Control-Allow-Origin", "https://example.com")
            .header("Access-Control-Allow-Methods", "GET")
            .header("Access-Control-Allow-Methods", "HEAD")
            .body(())
            .unwrap();
        IsolationHeaders::default().apply(&mut response);
        assert_isolation_headers(&response);
    }

    #[test]
    fn test_apply_twice_is_stable() {
        let headers = IsolationHeaders::default();
        let mut response = Response::new(());
        headers.apply(&mut response);
        headers.apply(&mut response);
        assert_isolation_headers(&response);
    }

    #[test]
    fn test_wire_lines() {
        let lines = IsolationHeaders::default().wire_lines();
        assert_eq!(
            String::from_utf8(lines).unwrap(),
            "Cross-Origin-Opener-Policy: same-origin\r\n\
             Cross-Origin-Embedder-Policy: require-corp\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
             Access-Control-Allow-Headers: *\r\n"
        );
    }
}
