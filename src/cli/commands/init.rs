//! Implementation of the `fixloop init` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::setup::{initialize, InitOutcome, SetupPaths};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_file: PathBuf,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        format!("{}\n  {}", self.message, self.config_file.display())
    }
}

pub fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let paths = SetupPaths::for_root(&target_path);
    let outcome = initialize(&paths, args.force)?;

    let output_data = InitOutput {
        success: outcome != InitOutcome::AlreadyInitialized,
        message: match outcome {
            InitOutcome::Created => "Project initialized.".to_string(),
            InitOutcome::Overwritten => "Configuration reset to defaults.".to_string(),
            InitOutcome::AlreadyInitialized => {
                "Project already initialized. Use --force to overwrite.".to_string()
            }
        },
        config_file: paths.config_file,
    };
    output(&output_data, json_mode);
    Ok(())
}
