//! Domain layer for the fixloop repair engine
//!
//! This module contains the result and budget models, the error taxonomy,
//! and the port traits that collaborators implement.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{
    AttemptError, DomainError, DomainResult, GitOperationError, ProposalError, StoreError,
};
