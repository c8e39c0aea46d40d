//! Test runner port - executes the verification command.

use async_trait::async_trait;

/// Captured result of one test command run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestRun {
    /// Process exit code; `None` when killed, timed out, or never started.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl TestRun {
    pub fn passed(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out
    }

    /// stdout and stderr joined into one blob.
    pub fn combined_output(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, _) => self.stderr.clone(),
            (_, true) => self.stdout.clone(),
            _ => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// Runs a shell command and reports pass/fail with output.
///
/// Never errors: spawn failures and timeouts come back as failing runs.
#[async_trait]
pub trait TestRunner: Send + Sync {
    async fn run(&self, command: &str) -> TestRun;
}
