//! HTTP Range request parsing module
//!
//! Single byte-range parsing for resumable downloads and media seeking (RFC 7233).

/// Parsed Range request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRequest {
    /// Start byte position
    pub start: usize,
    /// End byte position, None means until end of file
    pub end: Option<usize>,
}

impl RangeRequest {
    /// Inclusive `(start, end)` byte positions within a file of `file_size` bytes
    #[inline]
    pub fn bounds(&self, file_size: usize) -> (usize, usize) {
        let end = self.end.unwrap_or_else(|| file_size.saturating_sub(1));
        (self.start, end)
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Valid range request
    Valid(RangeRequest),
    /// Range not satisfiable (start >= `file_size`) - should return 416
    NotSatisfiable,
    /// No Range header or malformed (ignore, return full content)
    None,
}

/// Parse HTTP Range header (single range only, bytes unit)
///
/// Supported formats:
/// - `bytes=start-end` - Specific range
/// - `bytes=start-` - From start to end
/// - `bytes=-suffix` - Last suffix bytes
pub fn parse_range_header(range_header: Option<&str>, file_size: usize) -> RangeParseResult {
    let Some(header) = range_header else {
        return RangeParseResult::None;
    };

    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        return RangeParseResult::None; // Not bytes unit, ignore
    };

    // Multi-range responses need multipart bodies, serve the whole file instead
    if spec.contains(',') {
        return RangeParseResult::None;
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return RangeParseResult::None;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    // Nothing can be satisfied within an empty file
    if file_size == 0 && (!start_str.is_empty() || !end_str.is_empty()) {
        return RangeParseResult::NotSatisfiable;
    }

    if start_str.is_empty() {
        return parse_suffix_range(end_str, file_size);
    }

    parse_standard_range(start_str, end_str, file_size)
}

/// Parse suffix range (e.g., "-500")
fn parse_suffix_range(suffix_str: &str, file_size: usize) -> RangeParseResult {
    let Ok(suffix) = suffix_str.parse::<usize>() else {
        return RangeParseResult::None;
    };

    if suffix == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    // Suffix larger than file is valid, just return whole file as range
    RangeParseResult::Valid(RangeRequest {
        start: file_size.saturating_sub(suffix),
        end: Some(file_size - 1),
    })
}

/// Parse standard range (e.g., "0-99" or "100-")
fn parse_standard_range(start_str: &str, end_str: &str, file_size: usize) -> RangeParseResult {
    let Ok(start) = start_str.parse::<usize>() else {
        return RangeParseResult::None;
    };

    let end = if end_str.is_empty() {
        None
    } else {
        let Ok(e) = end_str.parse::<usize>() else {
            return RangeParseResult::None;
        };
        // "10-5" is syntactically invalid and ignored
        if e < start {
            return RangeParseResult::None;
        }
        Some(e.min(file_size.saturating_sub(1)))
    };

    if start >= file_size {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(RangeRequest { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_bounds(header: &str, file_size: usize) -> (usize, usize) {
        match parse_range_header(Some(header), file_size) {
            RangeParseResult::Valid(r) => r.bounds(file_size),
            other => panic!("Expected Valid for {header}, got {other:?}"),
        }
    }

    #[test]
    fn test_no_range() {
        assert_eq!(parse_range_header(None, 100), RangeParseResult::None);
    }

    #[test]
    fn test_standard_range() {
        assert_eq!(valid_bounds("bytes=0-9", 100), (0, 9));
        assert_eq!(valid_bounds("bytes=90-200", 100), (90, 99));
    }

    #[test]
    fn test_open_range() {
        assert_eq!(valid_bounds("bytes=50-", 100), (50, 99));
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(valid_bounds("bytes=-20", 100), (80, 99));
        assert_eq!(valid_bounds("bytes=-500", 100), (0, 99));
    }

    #[test]
    fn test_not_satisfiable() {
        assert_eq!(
            parse_range_header(Some("bytes=200-"), 100),
            RangeParseResult::NotSatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=-0"), 100),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(
            parse_range_header(Some("bytes=0-"), 0),
            RangeParseResult::NotSatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=-10"), 0),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn test_invalid_format() {
        for header in [
            "bytes=a-b",
            "bytes=0-9,20-29",
            "bytes=10-5",
            "items=0-9",
            "bytes=5",
        ] {
            assert_eq!(
                parse_range_header(Some(header), 100),
                RangeParseResult::None,
                "{header}"
            );
        }
    }
}
