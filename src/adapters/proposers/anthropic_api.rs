//! Anthropic Messages API patch proposer.
//!
//! Sends the file, its name, and the error text in a single non-streaming
//! request and returns whatever text blocks come back. The reply is treated
//! as untrusted; the Fix Engine normalizes it before use.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::errors::ProposalError;
use crate::domain::models::ProposerConfig;
use crate::domain::ports::{PatchProposer, Proposal, ProposalRequest, TokenUsage};

const SYSTEM_PROMPT: &str = "You repair source files. Reply with the complete corrected file \
contents only, with no explanation. Keep everything that is not part of the fix unchanged.";

/// Configuration for the Anthropic API proposer.
#[derive(Debug, Clone)]
pub struct AnthropicApiConfig {
    /// API key (read from `api_key_env` if not set).
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: String,
    /// API base URL.
    pub base_url: String,
    /// API version header.
    pub api_version: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AnthropicApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            api_version: "2023-06-01".to_string(),
            timeout_secs: 120,
        }
    }
}

impl AnthropicApiConfig {
    pub fn from_proposer_config(config: &ProposerConfig) -> Self {
        Self {
            api_key_env: config.api_key_env.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
            ..Default::default()
        }
    }

    /// Get API key from config or environment.
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Create config with explicit API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Point at a different endpoint (used by tests against a mock server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Message role in Anthropic API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Content block in a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// Request to the Anthropic Messages API.
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
}

/// Usage information from the API.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Response from the Anthropic Messages API.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub stop_reason: Option<String>,
    pub usage: Usage,
}

/// Anthropic API proposer implementation.
pub struct AnthropicApiProposer {
    config: AnthropicApiConfig,
    client: Client,
}

impl AnthropicApiProposer {
    /// Create a new Anthropic API proposer.
    pub fn new(config: AnthropicApiConfig) -> Result<Self, ProposalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ProposalError::Unavailable(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    /// Build the Messages API request from a proposal request.
    fn build_request(request: &ProposalRequest) -> MessagesRequest {
        let prompt = format!(
            "File: {}\n\nError:\n{}\n\nCurrent contents:\n```\n{}\n```",
            request.filename, request.error_context, request.source_text
        );

        MessagesRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            system: SYSTEM_PROMPT.to_string(),
            messages: vec![Message {
                role: MessageRole::User,
                content: prompt,
            }],
            temperature: request.temperature,
        }
    }
}

#[async_trait]
impl PatchProposer for AnthropicApiProposer {
    fn name(&self) -> &'static str {
        "anthropic_api"
    }

    async fn propose(&self, request: &ProposalRequest) -> Result<Proposal, ProposalError> {
        let api_key = self.config.get_api_key().ok_or_else(|| {
            ProposalError::Unavailable(format!("{} not set", self.config.api_key_env))
        })?;

        tracing::debug!(
            filename = %request.filename,
            model = %request.model,
            max_tokens = request.max_tokens,
            "requesting patch proposal"
        );

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&Self::build_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProposalError::Timeout(self.config.timeout_secs)
                } else {
                    ProposalError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(if status.as_u16() == 402 || body.contains("credit balance") {
                ProposalError::BudgetExceeded(format!("API error {status}: {body}"))
            } else {
                ProposalError::Request(format!("API error {status}: {body}"))
            });
        }

        let result: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProposalError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        // Extract text from content blocks
        let text = result
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        tracing::debug!(
            model = %result.model,
            stop_reason = ?result.stop_reason,
            input_tokens = result.usage.input_tokens,
            output_tokens = result.usage.output_tokens,
            "patch proposal received"
        );

        Ok(Proposal {
            text,
            usage: Some(TokenUsage {
                input_tokens: result.usage.input_tokens,
                output_tokens: result.usage.output_tokens,
            }),
        })
    }
}
