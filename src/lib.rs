//! fixloop - budget-aware automated repair of failing source files
//!
//! A patch proposer suggests replacement source for a file, the project's test
//! command verifies it, and the original content is restored whenever the
//! tests still fail. Every proposer call is checked against a daily and a
//! per-operation spend limit first.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): value types, errors, and port traits
//! - **Service Layer** (`services`): cost ledger, fix engine, failure locator, CI driver
//! - **Adapters** (`adapters`): filesystem, test process, git, and proposer backends
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, ledger persistence
//! - **CLI Layer** (`cli`): command-line interface and composition root
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fixloop::services::{CostLedger, FixEngine};
//!
//! let engine = FixEngine::new(proposer, files, tests, ledger, config.fix.clone());
//! let result = engine.attempt_fix("src/cart.js", "expected 3, got -1").await?;
//! assert!(result.success() || result.error().is_some());
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{AttemptError, DomainError, DomainResult};
pub use domain::models::{
    BatchResult, Config, CostReport, FixAttemptResult, FixState, FixTarget, RetryOutcome,
};
pub use domain::ports::{Clock, FileStore, GitClient, PatchProposer, TestRunner};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CiDriver, CostLedger, FixEngine};
