//! Filesystem-backed repositories.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::fetch::{FetchError, ModelFetcher};

/// Reads models from a directory tree.
#[derive(Debug, Clone)]
pub struct LocalModelFetcher {
    root: PathBuf,
}

impl LocalModelFetcher {
    /// Create a fetcher rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        // Relative paths always use '/', whatever the host separator
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }
}

#[async_trait]
impl ModelFetcher for LocalModelFetcher {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let full_path = self.resolve(path);
        log::debug!("Fetching model content from {:?}", full_path);

        match tokio::fs::read_to_string(&full_path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FetchError::NotFound(
                full_path.to_string_lossy().to_string(),
            )),
            Err(e) => Err(FetchError::Transport {
                location: full_path.to_string_lossy().to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn location(&self, path: &str) -> String {
        self.resolve(path).to_string_lossy().to_string()
    }
}
