//! Proposer registry and factory.

use std::sync::Arc;

use crate::domain::errors::ProposalError;
use crate::domain::models::ProposerConfig;
use crate::domain::ports::PatchProposer;

use super::anthropic_api::{AnthropicApiConfig, AnthropicApiProposer};
use super::mock::MockProposer;

/// Supported proposer backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposerType {
    AnthropicApi,
    Mock,
}

impl ProposerType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" | "anthropic_api" => Some(Self::AnthropicApi),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnthropicApi => "anthropic",
            Self::Mock => "mock",
        }
    }
}

/// Builds proposers from configuration.
pub struct ProposerRegistry {
    anthropic_api_config: AnthropicApiConfig,
}

impl ProposerRegistry {
    pub fn new(config: &ProposerConfig) -> Self {
        Self {
            anthropic_api_config: AnthropicApiConfig::from_proposer_config(config),
        }
    }

    pub fn with_anthropic_api_config(mut self, config: AnthropicApiConfig) -> Self {
        self.anthropic_api_config = config;
        self
    }

    /// Create a proposer by type.
    pub fn create_by_type(
        &self,
        proposer_type: ProposerType,
    ) -> Result<Arc<dyn PatchProposer>, ProposalError> {
        match proposer_type {
            ProposerType::AnthropicApi => Ok(Arc::new(AnthropicApiProposer::new(
                self.anthropic_api_config.clone(),
            )?)),
            ProposerType::Mock => Ok(Arc::new(MockProposer::new())),
        }
    }

    /// Create a proposer from its configured name.
    pub fn create(&self, provider: &str) -> Result<Arc<dyn PatchProposer>, ProposalError> {
        let proposer_type = ProposerType::parse(provider).ok_or_else(|| {
            ProposalError::Unavailable(format!("unknown proposer provider '{provider}'"))
        })?;
        self.create_by_type(proposer_type)
    }

    pub fn available_types() -> Vec<&'static str> {
        vec![ProposerType::AnthropicApi.as_str(), ProposerType::Mock.as_str()]
    }
}
