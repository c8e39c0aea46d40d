//! Patch proposer port - interface for the generative model backend.

use async_trait::async_trait;

use crate::domain::errors::ProposalError;

/// Everything a proposer needs to suggest a replacement for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalRequest {
    pub source_text: String,
    pub filename: String,
    pub error_context: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Token usage reported by a backend, when it reports any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Raw, untrusted proposer output. May be wrapped in code fences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Trait for patch proposer implementations.
///
/// Implementations enforce their own request timeout and report it as
/// [`ProposalError::Timeout`].
#[async_trait]
pub trait PatchProposer: Send + Sync {
    /// Backend name, used in logs.
    fn name(&self) -> &'static str;

    /// Ask the backend for replacement source text.
    async fn propose(&self, request: &ProposalRequest) -> Result<Proposal, ProposalError>;
}
