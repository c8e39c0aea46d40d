//! Git port - commit and push accepted fixes.

use async_trait::async_trait;

use crate::domain::errors::GitOperationError;

/// Each step succeeds or fails on its own; failures never undo fixes.
#[async_trait]
pub trait GitClient: Send + Sync {
    async fn configure_identity(&self, name: &str, email: &str) -> Result<(), GitOperationError>;

    async fn stage_all(&self) -> Result<(), GitOperationError>;

    async fn commit(&self, message: &str) -> Result<(), GitOperationError>;

    async fn push(&self) -> Result<(), GitOperationError>;
}
