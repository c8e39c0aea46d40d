//! JSON persistence for the cost ledger between CLI invocations.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::domain::models::BudgetState;

/// Reads and writes a [`BudgetState`] as a JSON document.
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    path: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no state has been saved yet.
    pub async fn load(&self) -> Result<Option<BudgetState>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read ledger state {}", self.path.display())
                })
            }
        };

        let state = serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt ledger state in {}", self.path.display()))?;
        Ok(Some(state))
    }

    /// Write through a sibling temp file so a crash never leaves half a document.
    pub async fn save(&self, state: &BudgetState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(state).context("Failed to serialize ledger state")?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        tracing::debug!(
            path = %self.path.display(),
            daily_spend = state.daily_spend,
            operation_count = state.operation_count,
            "ledger state saved"
        );
        Ok(())
    }
}
