// Application state module
// Immutable state shared by every connection for the life of the process

use std::io;
use std::path::{Path, PathBuf};

use super::types::Config;
use crate::http::IsolationHeaders;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Canonical root directory, every served path must stay below it
    pub root: PathBuf,
    pub headers: IsolationHeaders,
}

impl AppState {
    /// Build state from configuration, resolving the root directory once
    pub fn new(config: Config) -> io::Result<Self> {
        let root = Path::new(&config.server.root).canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Root is not a directory: {}", root.display()),
            ));
        }

        Ok(Self {
            config,
            root,
            headers: IsolationHeaders::default(),
        })
    }
}
