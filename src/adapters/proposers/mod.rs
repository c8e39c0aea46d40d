//! Patch proposer implementations.

pub mod anthropic_api;
pub mod mock;
pub mod registry;

pub use anthropic_api::{AnthropicApiConfig, AnthropicApiProposer};
pub use mock::{MockProposer, MockResponse};
pub use registry::{ProposerRegistry, ProposerType};
