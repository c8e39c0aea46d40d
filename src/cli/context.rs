//! Composition root: turns a resolved [`Config`] into wired services.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::fs::LocalFileStore;
use crate::adapters::process::{GitCli, ShellTestRunner};
use crate::adapters::proposers::{ProposerRegistry, ProposerType};
use crate::domain::models::{CiConfig, Config};
use crate::domain::ports::{Clock, FileStore, GitClient, PatchProposer, SystemClock, TestRunner};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::JsonLedgerStore;
use crate::services::{CiDriver, CostLedger, FixEngine};

use super::types::GlobalOpts;

/// Resolve configuration for this invocation.
///
/// `--config` replaces the project files; environment overrides apply either way.
pub fn load_config(opts: &GlobalOpts) -> Result<Config> {
    let mut config = match opts.config {
        Some(ref path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    if opts.dry_run {
        config.proposer.provider = "mock".to_string();
        config.fix.dry_run = true;
        config.ci.auto_commit = false;
        config.ci.auto_push = false;
    }
    Ok(config)
}

/// Everything a command needs, built once per process.
pub struct AppContext {
    pub config: Config,
    root: PathBuf,
    engine: Arc<FixEngine>,
    files: Arc<dyn FileStore>,
    tests: Arc<dyn TestRunner>,
    ledger_store: Option<JsonLedgerStore>,
}

impl AppContext {
    /// Wire the real adapters rooted at the current directory.
    pub async fn build(config: Config) -> Result<Self> {
        let root = std::env::current_dir().context("Failed to get current directory")?;
        Self::build_at(config, root).await
    }

    pub async fn build_at(config: Config, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        let proposer: Arc<dyn PatchProposer> = ProposerRegistry::new(&config.proposer)
            .create(&config.proposer.provider)
            .context("Failed to create patch proposer")?;

        let files: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(&root));
        let tests: Arc<dyn TestRunner> = Arc::new(ShellTestRunner::new(
            &root,
            Duration::from_secs(config.fix.test_timeout_secs),
        ));

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ledger_store = config
            .budget
            .state_file
            .as_ref()
            .map(|path| JsonLedgerStore::new(resolve(&root, path)));

        let ledger = match ledger_store {
            Some(ref store) => match store.load().await? {
                Some(state) => CostLedger::restore(state, &config.budget, clock),
                None => CostLedger::new(&config.budget, clock),
            },
            None => CostLedger::new(&config.budget, clock),
        };

        tracing::debug!(
            proposer = proposer.name(),
            root = %root.display(),
            ledger = ?ledger,
            "services wired"
        );

        let engine = Arc::new(FixEngine::new(
            proposer,
            Arc::clone(&files),
            Arc::clone(&tests),
            ledger,
            config.fix.clone(),
        ));

        Ok(Self {
            config,
            root,
            engine,
            files,
            tests,
            ledger_store,
        })
    }

    pub fn engine(&self) -> &FixEngine {
        &self.engine
    }

    pub fn ledger(&self) -> &CostLedger {
        self.engine.ledger()
    }

    /// CI driver over the shared engine, with a per-run CI configuration.
    pub fn ci_driver_with(&self, ci: CiConfig) -> CiDriver {
        let git: Arc<dyn GitClient> = Arc::new(GitCli::new(&self.root));
        CiDriver::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.tests),
            Arc::clone(&self.files),
            git,
            ci,
        )
    }

    /// Running against the mock proposer; nothing was actually spent.
    pub fn is_offline(&self) -> bool {
        ProposerType::parse(&self.config.proposer.provider) == Some(ProposerType::Mock)
    }

    /// Save the ledger if a state file is configured and this is a real run.
    pub async fn persist_ledger(&self) -> Result<()> {
        if self.is_offline() {
            return Ok(());
        }
        if let Some(ref store) = self.ledger_store {
            store.save(&self.ledger().snapshot().await).await?;
        }
        Ok(())
    }
}

fn resolve(root: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}
