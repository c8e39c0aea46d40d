//! Command-line interface.

pub mod commands;
pub mod context;
pub mod output;
pub mod types;

use console::style;
use std::process::ExitCode;

pub use context::{load_config, AppContext};
pub use types::{Cli, Commands, GlobalOpts};

use crate::infrastructure::logging::{LogConfig, LoggerImpl};

/// Print an error (or its JSON form) and return `code`.
pub fn handle_error(err: &anyhow::Error, json_mode: bool, code: ExitCode) -> ExitCode {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": chain,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );
    } else {
        eprintln!("{} {err:#}", style("error:").red().bold());
    }
    code
}

/// Run a parsed command line to completion.
pub async fn run(cli: Cli) -> ExitCode {
    let opts = GlobalOpts::from(&cli);
    let error_code = cli.command.error_exit_code();

    // init must work even when the existing config is broken
    let command = match cli.command {
        Commands::Init(args) => {
            let _logger = LoggerImpl::init(&LogConfig::default()).ok();
            return match commands::init::execute(args, opts.json) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => handle_error(&err, opts.json, error_code),
            };
        }
        other => other,
    };

    let config = match load_config(&opts) {
        Ok(config) => config,
        Err(err) => return handle_error(&err, opts.json, error_code),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("{} logging disabled: {err:#}", style("warning:").yellow());
            None
        }
    };

    let ctx = match AppContext::build(config).await {
        Ok(ctx) => ctx,
        Err(err) => return handle_error(&err, opts.json, error_code),
    };
    if ctx.is_offline() {
        tracing::info!("dry run: using the mock proposer, no spend is persisted");
    }

    let result = match command {
        Commands::Fix(args) => commands::fix::execute(args, &ctx, opts.json).await,
        Commands::Batch(args) => commands::batch::execute(args, &ctx, opts.json).await,
        Commands::Ci(args) => commands::ci::execute(args, &ctx, opts.json).await,
        Commands::Budget => commands::budget::execute(&ctx, opts.json)
            .await
            .map(|()| ExitCode::SUCCESS),
        Commands::Init(_) => Ok(ExitCode::SUCCESS),
    };

    result.unwrap_or_else(|err| handle_error(&err, opts.json, error_code))
}
