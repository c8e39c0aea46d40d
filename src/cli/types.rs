//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use super::commands::batch::BatchArgs;
use super::commands::ci::CiArgs;
use super::commands::fix::FixArgs;
use super::commands::init::InitArgs;

#[derive(Parser, Debug)]
#[command(name = "fixloop")]
#[command(about = "fixloop - budget-aware propose, test, rollback repair loop", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Config file to use instead of .fixloop/config.yaml and .fixloop/local.yaml
    #[arg(short, long, global = true, env = "FIXLOOP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Offline run: the mock proposer echoes each file, tests still run, and
    /// every file is restored afterwards; nothing is spent or committed
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Attempt to fix a single file
    Fix(FixArgs),

    /// Attempt to fix several files concurrently
    Batch(BatchArgs),

    /// Run the tests, fix the files they point at, and retry until green
    Ci(CiArgs),

    /// Show today's spend against the configured limits
    Budget,

    /// Write a default .fixloop/config.yaml
    Init(InitArgs),
}

/// Exit code for configuration and runtime errors, distinct from "fixes failed".
pub const EXIT_ERROR: u8 = 2;

impl Commands {
    /// Exit code when the command cannot run at all. Single-file `fix` keeps
    /// its two-valued contract: 0 on success, 1 for anything else.
    pub fn error_exit_code(&self) -> ExitCode {
        match self {
            Self::Fix(_) => ExitCode::FAILURE,
            _ => ExitCode::from(EXIT_ERROR),
        }
    }
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    pub json: bool,
    pub config: Option<PathBuf>,
    pub dry_run: bool,
}

impl From<&Cli> for GlobalOpts {
    fn from(cli: &Cli) -> Self {
        Self {
            json: cli.json,
            config: cli.config.clone(),
            dry_run: cli.dry_run,
        }
    }
}
