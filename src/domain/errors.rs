//! Domain errors for the fixloop repair engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single fix attempt did not end in an accepted patch.
///
/// These are captured at the Fix Engine boundary and stored on the
/// [`FixAttemptResult`](crate::domain::models::FixAttemptResult); they never
/// propagate into batch aggregation.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AttemptError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Budget exceeded: {0}")]
    BudgetExceeded(String),

    #[error("Patch proposal failed: {0}")]
    Proposal(String),

    #[error("Patch proposal contained no code")]
    EmptyProposal,

    #[error("Tests failed after applying patch (exit code {})", format_exit_code(.exit_code))]
    TestFailure { exit_code: Option<i32> },

    #[error("File access failed: {0}")]
    FileAccess(String),
}

fn format_exit_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// Failure of one git step. Never undoes accepted fixes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("git {step} failed: {message}")]
pub struct GitOperationError {
    pub step: String,
    pub message: String,
}

impl GitOperationError {
    pub fn new(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            message: message.into(),
        }
    }
}

/// Errors from a patch proposer backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProposalError {
    #[error("Proposer unavailable: {0}")]
    Unavailable(String),

    #[error("Proposer request failed: {0}")]
    Request(String),

    #[error("Proposer request timed out after {0}s")]
    Timeout(u64),

    #[error("Proposer returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Proposer budget exceeded: {0}")]
    BudgetExceeded(String),
}

/// Errors from a file store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that escape the Fix Engine and terminate the run.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Rollback of {path} failed, file may be left patched: {source}")]
    RollbackFailed {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
