//! Test runner that shells out to the project's test command.

use async_trait::async_trait;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::domain::ports::{TestRun, TestRunner};

/// Runs the configured command through `sh -c` in a working directory.
///
/// The command runs in its own process group. If it outlives `timeout` the
/// whole group is killed, so helpers it started (`npm test` → node, test
/// servers) go with it; the run then reports no exit code and
/// `timed_out = true`.
#[derive(Debug, Clone)]
pub struct ShellTestRunner {
    working_dir: PathBuf,
    timeout: Duration,
}

impl ShellTestRunner {
    pub fn new(working_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            working_dir: working_dir.into(),
            timeout,
        }
    }
}

#[async_trait]
impl TestRunner for ShellTestRunner {
    async fn run(&self, command: &str) -> TestRun {
        tracing::info!(
            command,
            working_dir = %self.working_dir.display(),
            "Running test command"
        );

        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(command, error = %e, "Failed to spawn test command");
                return TestRun {
                    exit_code: None,
                    stdout: String::new(),
                    stderr: format!("failed to spawn test command: {e}"),
                    timed_out: false,
                };
            }
        };

        let pid = child.id();
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let run = TestRun {
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    timed_out: false,
                };
                tracing::info!(
                    command,
                    exit_code = ?run.exit_code,
                    pass = run.passed(),
                    "Test command complete"
                );
                run
            }
            Ok(Err(e)) => {
                tracing::error!(command, error = %e, "Failed to collect test output");
                TestRun {
                    exit_code: None,
                    stdout: String::new(),
                    stderr: format!("failed to collect test output: {e}"),
                    timed_out: false,
                }
            }
            Err(_) => {
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                tracing::warn!(
                    command,
                    timeout_secs = self.timeout.as_secs(),
                    "Test command timed out"
                );
                TestRun {
                    exit_code: None,
                    stdout: String::new(),
                    stderr: format!("test command timed out after {}s", self.timeout.as_secs()),
                    timed_out: true,
                }
            }
        }
    }
}

/// SIGKILL every process in the group led by `pid`.
fn kill_process_group(pid: u32) {
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pid, error = %e, "Failed to kill test process group"),
    }
}
