//! Directory listing module
//!
//! Renders an HTML index of a directory that has no index file.

use crate::http::response::escape_html;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::io;
use std::path::Path;
use tokio::fs;

/// Everything but RFC 3986 unreserved characters is encoded in links
const LINK_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// One row of the listing
#[derive(Debug, PartialEq, Eq)]
struct ListingEntry {
    name: String,
    is_dir: bool,
    is_symlink: bool,
}

impl ListingEntry {
    /// Text shown for the entry: directories end in `/`, symlinks in `@`
    fn display_name(&self) -> String {
        if self.is_symlink {
            format!("{}@", self.name)
        } else if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    fn href(&self) -> String {
        let encoded = utf8_percent_encode(&self.name, LINK_ENCODE_SET).to_string();
        if self.is_dir {
            encoded + "/"
        } else {
            encoded
        }
    }
}

/// Render the listing page for `dir`, titled with the decoded request path
pub async fn render_listing(dir: &Path, display_path: &str) -> io::Result<String> {
    let entries = read_entries(dir).await?;
    let title = escape_html(&format!("Directory listing for {display_path}"));

    let mut items = String::new();
    for entry in &entries {
        items.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape_html(&entry.href()),
            escape_html(&entry.display_name())
        ));
    }

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<h1>{title}</h1>
<hr>
<ul>
{items}</ul>
<hr>
</body>
</html>
"#
    ))
}

/// Read directory entries sorted case-insensitively by name
async fn read_entries(dir: &Path) -> io::Result<Vec<ListingEntry>> {
    let mut read_dir = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = read_dir.next_entry().await? {
        let file_type = entry.file_type().await?;
        let is_symlink = file_type.is_symlink();
        // A link to a directory still gets a trailing slash in its href
        let is_dir = if is_symlink {
            fs::metadata(entry.path()).await.is_ok_and(|m| m.is_dir())
        } else {
            file_type.is_dir()
        };
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            is_symlink,
        });
    }

    entries.sort_by_cached_key(|e| e.name.to_lowercase());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestRoot;

    #[tokio::test]
    async fn test_listing_sorted_and_decorated() {
        let root = TestRoot::new();
        root.write("b.txt", b"b");
        root.write("A file.html", b"a");
        root.mkdir("css");

        let page = render_listing(root.path(), "/").await.unwrap();
        assert!(page.contains("<title>Directory listing for /</title>"));
        assert!(page.contains("<h1>Directory listing for /</h1>"));

        let a = page.find("A%20file.html").unwrap();
        let b = page.find("b.txt").unwrap();
        let css = page.find("css/").unwrap();
        assert!(a < b && b < css, "entries out of order:\n{page}");

        assert!(page.contains(r#"<li><a href="A%20file.html">A file.html</a></li>"#));
        assert!(page.contains(r#"<li><a href="css/">css/</a></li>"#));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_listing_escapes_names() {
        let root = TestRoot::new();
        root.write("<b>&.txt", b"x");

        let page = render_listing(root.path(), "/<dir>/").await.unwrap();
        assert!(page.contains("Directory listing for /&lt;dir&gt;/"));
        assert!(page.contains("&lt;b&gt;&amp;.txt"));
        assert!(page.contains("href=\"%3Cb%3E%26.txt\""));
        assert!(!page.contains("<b>"));
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let root = TestRoot::new();
        let page = render_listing(root.path(), "/empty/").await.unwrap();
        assert!(page.contains("<ul>\n</ul>"));
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let root = TestRoot::new();
        assert!(render_listing(&root.path().join("gone"), "/gone/")
            .await
            .is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_marker() {
        let root = TestRoot::new();
        root.mkdir("real");
        std::os::unix::fs::symlink(root.path().join("real"), root.path().join("alias")).unwrap();

        let page = render_listing(root.path(), "/").await.unwrap();
        assert!(page.contains(r#"<li><a href="alias/">alias@</a></li>"#));
        assert!(page.contains(r#"<li><a href="real/">real/</a></li>"#));
    }
}
