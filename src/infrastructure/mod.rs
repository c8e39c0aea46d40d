//! Infrastructure layer module
//!
//! Process-level concerns that sit outside the domain:
//! - Configuration management
//! - Logging infrastructure
//! - Ledger state persistence
//! - Project initialization

pub mod config;
pub mod ledger_store;
pub mod logging;
pub mod setup;

pub use ledger_store::JsonLedgerStore;
