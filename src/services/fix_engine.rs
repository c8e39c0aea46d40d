//! Per-file propose → apply → verify → accept-or-rollback state machine.
//!
//! Every exit path of [`FixEngine::attempt_fix`] leaves the target file either
//! holding the accepted patch or holding exactly its original content. Errors
//! along the way become a failed [`FixAttemptResult`]; the only error that
//! escapes is a failed rollback write, because at that point the file can no
//! longer be trusted. In dry-run mode a passing patch is reported as accepted
//! and then reverted too.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::errors::{AttemptError, DomainError, DomainResult, StoreError};
use crate::domain::models::{FixAttemptResult, FixConfig, FixState, FixTarget};
use crate::domain::ports::{FileStore, PatchProposer, ProposalRequest, TestRunner};

use super::cost_ledger::{cost_from_usage, CostLedger};
use super::failure_locator::path_key;
use super::normalize::normalize_proposal;

/// Instruction used when the caller has no error text to offer.
pub const DEFAULT_ERROR_CONTEXT: &str = "Fix any potential issues in this file.";

/// Drives single-file repair attempts against the injected collaborators.
pub struct FixEngine {
    proposer: Arc<dyn PatchProposer>,
    files: Arc<dyn FileStore>,
    tests: Arc<dyn TestRunner>,
    ledger: CostLedger,
    config: FixConfig,
}

/// Tracks where one attempt is in the state machine.
struct AttemptTracker<'a> {
    filename: &'a str,
    model: &'a str,
    state: FixState,
}

impl<'a> AttemptTracker<'a> {
    const fn new(filename: &'a str, model: &'a str) -> Self {
        Self {
            filename,
            model,
            state: FixState::Idle,
        }
    }

    fn advance(&mut self, next: FixState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal fix transition {} -> {}",
            self.state,
            next
        );
        debug!(filename = self.filename, from = %self.state, to = %next, "fix state transition");
        self.state = next;
    }

    fn fail(
        mut self,
        original: String,
        proposed: Option<String>,
        test_output: String,
        error: AttemptError,
        cost_usd: f64,
    ) -> FixAttemptResult {
        let terminal = if self.state == FixState::Applied || self.state == FixState::Tested {
            FixState::RolledBack
        } else {
            FixState::Failed
        };
        self.advance(terminal);
        warn!(filename = self.filename, state = %terminal, error = %error, "fix attempt failed");
        FixAttemptResult::failed(
            self.filename,
            original,
            proposed,
            test_output,
            error,
            terminal,
            self.model,
            cost_usd,
        )
    }
}

impl FixEngine {
    pub fn new(
        proposer: Arc<dyn PatchProposer>,
        files: Arc<dyn FileStore>,
        tests: Arc<dyn TestRunner>,
        ledger: CostLedger,
        config: FixConfig,
    ) -> Self {
        Self {
            proposer,
            files,
            tests,
            ledger,
            config,
        }
    }

    pub const fn ledger(&self) -> &CostLedger {
        &self.ledger
    }

    pub const fn config(&self) -> &FixConfig {
        &self.config
    }

    /// Run one attempt for `filename`.
    ///
    /// Returns `Err` only when restoring the original content fails.
    #[instrument(skip(self, error_context), fields(model = %self.config.model))]
    pub async fn attempt_fix(
        &self,
        filename: &str,
        error_context: &str,
    ) -> DomainResult<FixAttemptResult> {
        let model = self.config.model.as_str();
        let mut attempt = AttemptTracker::new(filename, model);

        if !self.files.exists(filename).await {
            return Ok(attempt.fail(
                String::new(),
                None,
                String::new(),
                AttemptError::NotFound(filename.to_string()),
                0.0,
            ));
        }

        let original = match self.files.read(filename).await {
            Ok(content) => content,
            Err(StoreError::NotFound(path)) => {
                return Ok(attempt.fail(
                    String::new(),
                    None,
                    String::new(),
                    AttemptError::NotFound(path),
                    0.0,
                ));
            }
            Err(e) => {
                return Ok(attempt.fail(
                    String::new(),
                    None,
                    String::new(),
                    AttemptError::FileAccess(e.to_string()),
                    0.0,
                ));
            }
        };

        let estimate = self
            .ledger
            .estimate(model, original.len(), self.config.max_output_tokens);
        let verdict = self.ledger.check(estimate).await;
        attempt.advance(FixState::CostChecked);
        if let Err(reason) = verdict {
            return Ok(attempt.fail(
                original,
                None,
                String::new(),
                AttemptError::BudgetExceeded(reason),
                0.0,
            ));
        }

        let request = ProposalRequest {
            source_text: original.clone(),
            filename: filename.to_string(),
            error_context: effective_error_context(error_context),
            model: model.to_string(),
            max_tokens: self.config.max_output_tokens,
            temperature: self.config.temperature,
        };

        let response = self.proposer.propose(&request).await;
        attempt.advance(FixState::Proposed);
        let proposal = match response {
            Ok(proposal) => proposal,
            Err(e) => {
                return Ok(attempt.fail(
                    original,
                    None,
                    String::new(),
                    AttemptError::Proposal(e.to_string()),
                    0.0,
                ));
            }
        };

        // The call happened, so it is paid for whatever comes next.
        let cost = proposal
            .usage
            .map_or(estimate, |usage| cost_from_usage(model, usage));
        self.ledger.record(cost).await;

        let patched = normalize_proposal(&proposal.text);
        if patched.is_empty() {
            return Ok(attempt.fail(
                original,
                None,
                String::new(),
                AttemptError::EmptyProposal,
                cost,
            ));
        }

        attempt.advance(FixState::Applied);
        if let Err(e) = self.files.write(filename, &patched).await {
            self.restore(filename, &original).await?;
            return Ok(attempt.fail(
                original,
                Some(patched),
                String::new(),
                AttemptError::FileAccess(e.to_string()),
                cost,
            ));
        }

        let run = self.tests.run(&self.config.test_command).await;
        attempt.advance(FixState::Tested);
        let test_output = run.combined_output();

        if run.passed() {
            if self.config.dry_run {
                self.restore(filename, &original).await?;
                info!(filename, "dry run: verified patch reverted");
            }
            attempt.advance(FixState::Accepted);
            let result = FixAttemptResult::accepted(
                filename,
                original,
                patched,
                test_output,
                model,
                cost,
            );
            info!(
                filename,
                lines_changed = result.lines_changed(),
                cost_usd = cost,
                "fix accepted"
            );
            return Ok(result);
        }

        self.restore(filename, &original).await?;
        Ok(attempt.fail(
            original,
            Some(patched),
            test_output,
            AttemptError::TestFailure {
                exit_code: run.exit_code,
            },
            cost,
        ))
    }

    /// Fix independent files concurrently and wait for all of them.
    ///
    /// A file named more than once, under any spelling that resolves to the
    /// same path, is attempted once (first occurrence wins). Two concurrent
    /// attempts on one file would each take the other's patch as the content
    /// to restore. One file's failure never stops the others; results follow
    /// input order.
    #[instrument(skip_all, fields(count = targets.len()))]
    pub async fn fix_many(&self, targets: Vec<FixTarget>) -> DomainResult<Vec<FixAttemptResult>> {
        let mut seen = HashSet::new();
        let unique: Vec<FixTarget> = targets
            .into_iter()
            .filter(|t| seen.insert(path_key(&t.filename)))
            .collect();

        let outcomes = join_all(
            unique
                .iter()
                .map(|t| self.attempt_fix(&t.filename, &t.error_context)),
        )
        .await;

        outcomes.into_iter().collect()
    }

    async fn restore(&self, filename: &str, original: &str) -> DomainResult<()> {
        self.files.write(filename, original).await.map_err(|source| {
            error!(filename, error = %source, "rollback failed");
            DomainError::RollbackFailed {
                path: filename.to_string(),
                source,
            }
        })?;
        debug!(filename, "original content restored");
        Ok(())
    }
}

fn effective_error_context(error_context: &str) -> String {
    if error_context.trim().is_empty() {
        DEFAULT_ERROR_CONTEXT.to_string()
    } else {
        error_context.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_context_gets_generic_instruction() {
        assert_eq!(effective_error_context("  \n"), DEFAULT_ERROR_CONTEXT);
        assert_eq!(effective_error_context("TypeError"), "TypeError");
    }
}
