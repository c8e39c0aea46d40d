//! CI pipeline: discover failing files, fix them, retry the whole round.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::domain::errors::{DomainResult, GitOperationError};
use crate::domain::models::{BatchResult, CiConfig, RetryOutcome};
use crate::domain::ports::{FileStore, GitClient, TestRunner};

use super::failure_locator::{FailureLocator, LocatorRules};
use super::fix_engine::FixEngine;

/// Batch-level repair across a failing test run.
///
/// Files inside one round are fixed one after another in discovery order.
/// For concurrent fixing of a known file list use
/// [`FixEngine::fix_many`] instead.
pub struct CiDriver {
    engine: Arc<FixEngine>,
    tests: Arc<dyn TestRunner>,
    files: Arc<dyn FileStore>,
    git: Arc<dyn GitClient>,
    locator: FailureLocator,
    config: CiConfig,
}

/// Bookkeeping for one `run_with_retries` call.
struct RetrySession {
    attempt_number: u32,
    max_retries: u32,
    last_batch: Option<BatchResult>,
}

impl RetrySession {
    const fn new(max_retries: u32) -> Self {
        Self {
            attempt_number: 0,
            max_retries,
            last_batch: None,
        }
    }

    const fn exhausted(&self) -> bool {
        self.attempt_number >= self.max_retries
    }
}

impl CiDriver {
    pub fn new(
        engine: Arc<FixEngine>,
        tests: Arc<dyn TestRunner>,
        files: Arc<dyn FileStore>,
        git: Arc<dyn GitClient>,
        config: CiConfig,
    ) -> Self {
        let locator = FailureLocator::new(LocatorRules::from(&config));
        Self {
            engine,
            tests,
            files,
            git,
            locator,
            config,
        }
    }

    fn test_command(&self) -> &str {
        &self.engine.config().test_command
    }

    /// Run one discovery-and-fix round.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> DomainResult<BatchResult> {
        let initial = self.tests.run(self.test_command()).await;
        if initial.passed() {
            info!("tests already passing, nothing to fix");
            return Ok(BatchResult::tests_already_passing());
        }

        let output = initial.combined_output();
        let targets = self
            .locator
            .identify_files_to_fix(&output, self.files.as_ref())
            .await;

        if targets.is_empty() {
            warn!("tests failed but no fixable source file was identified");
            return Ok(BatchResult::nothing_to_fix(
                "Could not identify any source file to fix from the test output",
                output,
            ));
        }

        info!(count = targets.len(), files = ?targets, "fixing files");
        let mut attempts = Vec::with_capacity(targets.len());
        for filename in &targets {
            attempts.push(self.engine.attempt_fix(filename, &output).await?);
        }

        let fixed: Vec<&str> = attempts
            .iter()
            .filter(|a| a.success())
            .map(|a| a.filename())
            .collect();

        let (committed, git_error) = if !fixed.is_empty() && self.config.auto_commit {
            match self.commit_fixes(&fixed).await {
                Ok(()) => (Some(true), None),
                Err(CommitFailure { committed, error }) => {
                    warn!(error = %error, "git step failed, fixes stay in the working tree");
                    (Some(committed), Some(error.to_string()))
                }
            }
        } else {
            (None, None)
        };

        let batch = BatchResult::from_attempts(attempts, committed, git_error);
        info!(
            attempted = batch.total_attempted(),
            successful = batch.successful(),
            failed = batch.failed(),
            "CI round finished"
        );
        Ok(batch)
    }

    /// Repeat [`run_once`](Self::run_once) until tests pass or `max_retries`
    /// rounds have run. Each round rediscovers its files from scratch.
    #[instrument(skip(self), fields(max_retries = self.config.max_retries))]
    pub async fn run_with_retries(&self) -> DomainResult<RetryOutcome> {
        let mut session = RetrySession::new(self.config.max_retries);
        let mut rounds = Vec::new();

        while !session.exhausted() {
            session.attempt_number += 1;
            if let Some(previous) = &session.last_batch {
                info!(
                    round = session.attempt_number,
                    previous_fixed = previous.successful(),
                    "tests still failing, starting another round"
                );
            }

            let batch = self.run_once().await?;
            let passed = if batch.tests_passed_initially() {
                true
            } else {
                self.tests.run(self.test_command()).await.passed()
            };
            rounds.push(batch.clone());
            session.last_batch = Some(batch);

            if passed {
                info!(attempts = session.attempt_number, "tests passing");
                return Ok(RetryOutcome {
                    attempts: session.attempt_number,
                    max_retries: session.max_retries,
                    final_tests_passed: true,
                    rounds,
                });
            }
        }

        warn!(attempts = session.attempt_number, "retries exhausted, tests still failing");
        Ok(RetryOutcome {
            attempts: session.attempt_number,
            max_retries: session.max_retries,
            final_tests_passed: false,
            rounds,
        })
    }

    async fn commit_fixes(&self, fixed: &[&str]) -> Result<(), CommitFailure> {
        let before_commit = |error| CommitFailure {
            committed: false,
            error,
        };

        self.git
            .configure_identity(&self.config.git_user_name, &self.config.git_user_email)
            .await
            .map_err(before_commit)?;
        self.git.stage_all().await.map_err(before_commit)?;
        self.git
            .commit(&self.config.render_commit_message(fixed))
            .await
            .map_err(before_commit)?;
        info!(files = fixed.len(), "committed fixes");

        if self.config.auto_push {
            self.git.push().await.map_err(|error| CommitFailure {
                committed: true,
                error,
            })?;
            info!("pushed fixes");
        }
        Ok(())
    }
}

/// Which git step broke, and whether the commit itself had landed.
struct CommitFailure {
    committed: bool,
    error: GitOperationError,
}
