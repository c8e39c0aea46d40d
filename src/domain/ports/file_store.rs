//! File store port - the working-tree files being repaired.

use async_trait::async_trait;

use crate::domain::errors::StoreError;

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn exists(&self, path: &str) -> bool;

    /// Fails with [`StoreError::NotFound`] when the file is absent.
    async fn read(&self, path: &str) -> Result<String, StoreError>;

    async fn write(&self, path: &str, contents: &str) -> Result<(), StoreError>;
}
