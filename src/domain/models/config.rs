use serde::{Deserialize, Serialize};

/// Main configuration structure for fixloop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Per-file fix attempt settings
    #[serde(default)]
    pub fix: FixConfig,

    /// CI pipeline settings
    #[serde(default)]
    pub ci: CiConfig,

    /// Spend limits
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Patch proposer backend
    #[serde(default)]
    pub proposer: ProposerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for a single fix attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FixConfig {
    /// Model name passed to the proposer and used for cost estimation
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on generated tokens per proposal
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Sampling temperature (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Shell command that verifies a patch; zero exit means pass
    #[serde(default = "default_test_command")]
    pub test_command: String,

    /// Seconds before the test command is killed and counted as a failure
    #[serde(default = "default_test_timeout_secs")]
    pub test_timeout_secs: u64,

    /// Verify patches but always put the original content back
    #[serde(default)]
    pub dry_run: bool,
}

fn default_model() -> String {
    "claude-sonnet-4-5".to_string()
}

const fn default_max_output_tokens() -> u32 {
    4096
}

const fn default_temperature() -> f32 {
    0.2
}

fn default_test_command() -> String {
    "npm test".to_string()
}

const fn default_test_timeout_secs() -> u64 {
    300
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            test_command: default_test_command(),
            test_timeout_secs: default_test_timeout_secs(),
            dry_run: false,
        }
    }
}

/// CI pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CiConfig {
    /// Whole-pipeline rounds before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// File to fix when no stack frame points anywhere useful
    #[serde(default)]
    pub default_file: Option<String>,

    /// Directory segments whose files are never fixed (vendored code)
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,

    /// Commit accepted fixes
    #[serde(default)]
    pub auto_commit: bool,

    /// Push after committing
    #[serde(default)]
    pub auto_push: bool,

    /// Commit message template; `{count}` and `{files}` are substituted
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Author name for automated commits
    #[serde(default = "default_git_user_name")]
    pub git_user_name: String,

    /// Author email for automated commits
    #[serde(default = "default_git_user_email")]
    pub git_user_email: String,
}

const fn default_max_retries() -> u32 {
    3
}

fn default_excluded_dirs() -> Vec<String> {
    ["node_modules", "vendor", ".git", "dist", "site-packages", "target"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_commit_message() -> String {
    "fix: automated repair of {count} file(s)\n\n{files}".to_string()
}

fn default_git_user_name() -> String {
    "fixloop".to_string()
}

fn default_git_user_email() -> String {
    "fixloop@users.noreply.github.com".to_string()
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            default_file: None,
            excluded_dirs: default_excluded_dirs(),
            auto_commit: false,
            auto_push: false,
            commit_message: default_commit_message(),
            git_user_name: default_git_user_name(),
            git_user_email: default_git_user_email(),
        }
    }
}

impl CiConfig {
    /// Render the commit message for the given fixed files.
    pub fn render_commit_message(&self, files: &[&str]) -> String {
        let listing = files
            .iter()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n");
        self.commit_message
            .replace("{count}", &files.len().to_string())
            .replace("{files}", &listing)
    }
}

/// Budget configuration (USD)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BudgetConfig {
    /// Maximum spend per calendar day
    #[serde(default = "default_daily_limit")]
    pub daily_limit_usd: f64,

    /// Maximum estimated spend for one proposer call
    #[serde(default = "default_per_operation_limit")]
    pub per_operation_limit_usd: f64,

    /// Where to keep the ledger between runs; process-lifetime only when unset
    #[serde(default)]
    pub state_file: Option<String>,
}

const fn default_daily_limit() -> f64 {
    10.0
}

const fn default_per_operation_limit() -> f64 {
    1.0
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_limit_usd: default_daily_limit(),
            per_operation_limit_usd: default_per_operation_limit(),
            state_file: None,
        }
    }
}

/// Patch proposer backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProposerConfig {
    /// Backend: anthropic or mock
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ProposerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling JSON log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly, never
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_log_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_message_substitutes_placeholders() {
        let ci = CiConfig::default();
        let msg = ci.render_commit_message(&["src/cart.js", "src/tax.js"]);
        assert!(msg.starts_with("fix: automated repair of 2 file(s)"));
        assert!(msg.contains("- src/cart.js\n- src/tax.js"));
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "fix:\n  test_command: cargo test\nci:\n  auto_commit: true\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.fix.test_command, "cargo test");
        assert_eq!(config.fix.max_output_tokens, 4096);
        assert!(config.ci.auto_commit);
        assert_eq!(config.ci.max_retries, 3);
        assert!(config.ci.excluded_dirs.iter().any(|d| d == "node_modules"));
        assert_eq!(config.proposer.provider, "anthropic");
    }
}
