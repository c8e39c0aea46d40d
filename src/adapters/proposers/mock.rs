//! Mock proposer for dry runs and tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::ProposalError;
use crate::domain::ports::{PatchProposer, Proposal, ProposalRequest, TokenUsage};

/// One scripted reply.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Output text
    pub output: String,
    /// Whether to simulate failure
    pub fail: bool,
    /// Error message if failing
    pub error_message: Option<String>,
    /// Usage to report; `None` makes the engine fall back to its estimate.
    pub usage: Option<TokenUsage>,
}

impl MockResponse {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            fail: false,
            error_message: None,
            usage: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            fail: true,
            error_message: Some(error.into()),
            usage: None,
        }
    }

    #[must_use]
    pub const fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.usage = Some(TokenUsage {
            input_tokens,
            output_tokens,
        });
        self
    }
}

/// Replays queued responses in order. With the queue empty it echoes the
/// source back unchanged and reports zero usage, which is what `--dry-run`
/// relies on.
pub struct MockProposer {
    queue: Arc<RwLock<VecDeque<MockResponse>>>,
    requests: Arc<RwLock<Vec<ProposalRequest>>>,
}

impl MockProposer {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(RwLock::new(VecDeque::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_responses(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        Self {
            queue: Arc::new(RwLock::new(responses.into_iter().collect())),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn push_response(&self, response: MockResponse) {
        self.queue.write().await.push_back(response);
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<ProposalRequest> {
        self.requests.read().await.clone()
    }
}

impl Default for MockProposer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PatchProposer for MockProposer {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn propose(&self, request: &ProposalRequest) -> Result<Proposal, ProposalError> {
        self.requests.write().await.push(request.clone());

        let Some(response) = self.queue.write().await.pop_front() else {
            return Ok(Proposal {
                text: request.source_text.clone(),
                usage: Some(TokenUsage::default()),
            });
        };

        if response.fail {
            return Err(ProposalError::Request(
                response
                    .error_message
                    .unwrap_or_else(|| "Mock failure".to_string()),
            ));
        }

        Ok(Proposal {
            text: response.output,
            usage: response.usage,
        })
    }
}
