//! Adapters that drive external processes (test command, git).

pub mod git_cli;
pub mod shell_test_runner;

pub use git_cli::GitCli;
pub use shell_test_runner::ShellTestRunner;
