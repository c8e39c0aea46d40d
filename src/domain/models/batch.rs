//! Aggregate outcome of a CI round.

use serde::Serialize;

use super::fix::FixAttemptResult;

/// Outcome of one `run_once` round across every targeted file.
///
/// The counts are derived from `attempted` at construction, so
/// `successful + failed == total_attempted` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    attempted: Vec<FixAttemptResult>,
    total_attempted: usize,
    successful: usize,
    failed: usize,
    tests_passed_initially: bool,
    committed: Option<bool>,
    diagnostic: Option<String>,
    test_output: Option<String>,
    git_error: Option<String>,
}

impl BatchResult {
    /// The test command passed before anything was touched.
    pub const fn tests_already_passing() -> Self {
        Self {
            attempted: Vec::new(),
            total_attempted: 0,
            successful: 0,
            failed: 0,
            tests_passed_initially: true,
            committed: None,
            diagnostic: None,
            test_output: None,
            git_error: None,
        }
    }

    /// Tests failed but no file could be identified as the culprit.
    pub fn nothing_to_fix(diagnostic: impl Into<String>, test_output: impl Into<String>) -> Self {
        Self {
            attempted: Vec::new(),
            total_attempted: 0,
            successful: 0,
            failed: 0,
            tests_passed_initially: false,
            committed: None,
            diagnostic: Some(diagnostic.into()),
            test_output: Some(test_output.into()),
            git_error: None,
        }
    }

    /// Aggregate a round of attempts.
    ///
    /// `committed` is `None` when no commit was tried, `git_error` carries the
    /// first failing git step when one was.
    pub fn from_attempts(
        attempted: Vec<FixAttemptResult>,
        committed: Option<bool>,
        git_error: Option<String>,
    ) -> Self {
        let successful = attempted.iter().filter(|a| a.success()).count();
        let total_attempted = attempted.len();
        Self {
            attempted,
            total_attempted,
            successful,
            failed: total_attempted - successful,
            tests_passed_initially: false,
            committed,
            diagnostic: None,
            test_output: None,
            git_error,
        }
    }

    pub fn attempted(&self) -> &[FixAttemptResult] {
        &self.attempted
    }

    pub const fn total_attempted(&self) -> usize {
        self.total_attempted
    }

    pub const fn successful(&self) -> usize {
        self.successful
    }

    pub const fn failed(&self) -> usize {
        self.failed
    }

    pub const fn tests_passed_initially(&self) -> bool {
        self.tests_passed_initially
    }

    pub const fn committed(&self) -> Option<bool> {
        self.committed
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub fn test_output(&self) -> Option<&str> {
        self.test_output.as_deref()
    }

    pub fn git_error(&self) -> Option<&str> {
        self.git_error.as_deref()
    }

    pub fn total_cost_usd(&self) -> f64 {
        self.attempted.iter().map(FixAttemptResult::cost_usd).sum()
    }
}

/// Final verdict of `run_with_retries`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetryOutcome {
    /// Rounds actually run.
    pub attempts: u32,
    pub max_retries: u32,
    pub final_tests_passed: bool,
    /// Every round's batch, oldest first. The last one supersedes the rest.
    pub rounds: Vec<BatchResult>,
}

impl RetryOutcome {
    pub fn last_batch(&self) -> Option<&BatchResult> {
        self.rounds.last()
    }

    pub fn total_fixed(&self) -> usize {
        self.rounds.iter().map(BatchResult::successful).sum()
    }
}
