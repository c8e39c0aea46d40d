//! Project initialization: writes `.fixloop/config.yaml`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::config::CONFIG_DIR;

/// Default configuration template content
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# fixloop configuration
# Override settings by editing this file, adding .fixloop/local.yaml, or
# setting environment variables with the FIXLOOP_ prefix
#
# Example environment variables:
#   export FIXLOOP_FIX__TEST_COMMAND="cargo test"
#   export FIXLOOP_BUDGET__DAILY_LIMIT_USD=2.5
#   export FIXLOOP_LOGGING__LEVEL=debug

# Per-file fix attempts
fix:
  # Model passed to the proposer; also selects the price tier
  model: "claude-sonnet-4-5"

  # Upper bound on generated tokens per proposal
  max_output_tokens: 4096

  # Sampling temperature (0.0-1.0)
  temperature: 0.2

  # Shell command that verifies a patch; exit code 0 means pass
  test_command: "npm test"

  # Seconds before the test command is killed
  test_timeout_secs: 300

# CI pipeline
ci:
  # Whole-pipeline rounds before giving up
  max_retries: 3

  # File to fix when the test output names nothing useful
  # default_file: "src/index.js"

  # Directory names whose files are never fixed
  excluded_dirs:
    - node_modules
    - vendor
    - .git
    - dist
    - site-packages
    - target

  # Commit accepted fixes, and push after committing
  auto_commit: false
  auto_push: false

  # {count} and {files} are substituted
  commit_message: "fix: automated repair of {count} file(s)\n\n{files}"
  git_user_name: "fixloop"
  git_user_email: "fixloop@users.noreply.github.com"

# Spend limits in USD
budget:
  daily_limit_usd: 10.0
  per_operation_limit_usd: 1.0

  # Keeps the day's spend across runs
  state_file: ".fixloop/budget.json"

# Patch proposer backend: anthropic or mock
proposer:
  provider: "anthropic"
  base_url: "https://api.anthropic.com"
  api_key_env: "ANTHROPIC_API_KEY"
  timeout_secs: 120

# Logging configuration
logging:
  # Log level: trace, debug, info, warn, error
  level: "info"

  # Console format: json, pretty
  format: "pretty"

  # Rolling JSON log files (daily, hourly, never)
  # log_dir: ".fixloop/logs"
  rotation: "daily"
"#;

/// Setup paths and directories
pub struct SetupPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl SetupPaths {
    /// Get setup paths for the current directory
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self::for_root(current_dir))
    }

    pub fn for_root(root: impl AsRef<Path>) -> Self {
        let config_dir = root.as_ref().join(CONFIG_DIR);
        Self {
            config_file: config_dir.join("config.yaml"),
            config_dir,
        }
    }

    /// Check if the project is already initialized
    pub fn is_initialized(&self) -> bool {
        self.config_file.exists()
    }
}

/// What `init` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    Overwritten,
    AlreadyInitialized,
}

/// Create the config directory and default config file.
///
/// An existing config file is left alone unless `force` is set.
pub fn initialize(paths: &SetupPaths, force: bool) -> Result<InitOutcome> {
    let existed = paths.is_initialized();
    if existed && !force {
        return Ok(InitOutcome::AlreadyInitialized);
    }

    fs::create_dir_all(&paths.config_dir).with_context(|| {
        format!(
            "Failed to create config directory {}",
            paths.config_dir.display()
        )
    })?;

    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE).with_context(|| {
        format!("Failed to write config file {}", paths.config_file.display())
    })?;

    Ok(if existed {
        InitOutcome::Overwritten
    } else {
        InitOutcome::Created
    })
}
