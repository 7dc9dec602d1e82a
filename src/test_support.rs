// Shared test fixtures

use hyper::Response;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::{AppState, Config};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Scratch directory under the system temp dir, removed on drop
pub struct TestRoot {
    path: PathBuf,
}

impl TestRoot {
    pub fn new() -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "isolated-serve-test-{}-{id}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        Self {
            path: dir.canonicalize().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a file relative to the root, creating parent directories
    pub fn write(&self, rel: &str, contents: &[u8]) {
        let file = self.path.join(rel);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(file, contents).unwrap();
    }

    pub fn mkdir(&self, rel: &str) {
        std::fs::create_dir_all(self.path.join(rel)).unwrap();
    }

    /// Default configuration serving this directory
    pub fn config(&self) -> Config {
        let mut cfg = Config::from_defaults().unwrap();
        cfg.server.root = self.path.display().to_string();
        cfg.logging.access_log = false;
        cfg
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::new(AppState::new(self.config()).unwrap())
    }
}

impl Drop for TestRoot {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Assert the five isolation headers are present exactly once with their fixed values
pub fn assert_isolation_headers<B>(response: &Response<B>) {
    for (name, value) in [
        ("cross-origin-opener-policy", "same-origin"),
        ("cross-origin-embedder-policy", "require-corp"),
        ("access-control-allow-origin", "*"),
        ("access-control-allow-methods", "GET, POST, OPTIONS"),
        ("access-control-allow-headers", "*"),
    ] {
        let values: Vec<_> = response.headers().get_all(name).iter().collect();
        assert_eq!(values.len(), 1, "{name} should appear exactly once");
        assert_eq!(values[0], value, "{name}");
    }
}
