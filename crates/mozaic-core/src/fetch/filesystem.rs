//! Local disk strategy: one synchronous read, reported through the same
//! async interface as the other strategies.

use super::FetchError;
use mozaic_util::fs::read_to_string_lossy;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct FilesystemFetcher {
    root: Option<PathBuf>,
}

impl FilesystemFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub(crate) fn locate(root: Option<&Path>, path: &str) -> PathBuf {
        match root {
            Some(root) if Path::new(path).is_relative() => root.join(path),
            _ => PathBuf::from(path),
        }
    }

    pub fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let file = Self::locate(self.root.as_deref(), path);
        read_to_string_lossy(&file).map_err(|source| FetchError::Io { path: file, source })
    }
}
