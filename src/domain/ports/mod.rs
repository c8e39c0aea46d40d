//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces that adapters must implement:
//! - PatchProposer: generative model that suggests replacement code
//! - TestRunner: shell command that verifies a patch
//! - FileStore: reads and writes the files being repaired
//! - GitClient: commits and pushes accepted fixes
//! - Clock: calendar date for budget rollover
//!
//! The Fix Engine and CI Driver only ever talk to these traits.

pub mod clock;
pub mod file_store;
pub mod git;
pub mod patch_proposer;
pub mod test_runner;

pub use clock::{Clock, SystemClock};
pub use file_store::FileStore;
pub use git::GitClient;
pub use patch_proposer::{PatchProposer, Proposal, ProposalRequest, TokenUsage};
pub use test_runner::{TestRun, TestRunner};
