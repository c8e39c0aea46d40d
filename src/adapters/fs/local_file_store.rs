//! File store over the local filesystem.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::errors::StoreError;
use crate::domain::ports::FileStore;

/// Resolves relative paths against a root directory; absolute paths pass through.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn exists(&self, path: &str) -> bool {
        tokio::fs::metadata(self.resolve(path))
            .await
            .is_ok_and(|m| m.is_file())
    }

    async fn read(&self, path: &str) -> Result<String, StoreError> {
        tokio::fs::read_to_string(self.resolve(path))
            .await
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => StoreError::NotFound(path.to_string()),
                _ => StoreError::Io {
                    path: path.to_string(),
                    source,
                },
            })
    }

    async fn write(&self, path: &str, contents: &str) -> Result<(), StoreError> {
        tokio::fs::write(self.resolve(path), contents)
            .await
            .map_err(|source| StoreError::Io {
                path: path.to_string(),
                source,
            })
    }
}
