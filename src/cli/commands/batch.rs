//! Implementation of the `fixloop batch` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::process::ExitCode;

use crate::cli::context::AppContext;
use crate::cli::output::{attempts_table, budget_summary, format_usd, output, CommandOutput};
use crate::domain::models::{CostReport, FixAttemptResult, FixTarget};

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Files to repair concurrently; repeats are attempted once
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<String>,

    /// Error context applied to every file
    #[arg(short, long)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchOutput {
    pub total_attempted: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_cost_usd: f64,
    pub results: Vec<FixAttemptResult>,
    pub budget: CostReport,
    pub dry_run: bool,
}

impl BatchOutput {
    fn new(results: Vec<FixAttemptResult>, budget: CostReport, dry_run: bool) -> Self {
        let successful = results.iter().filter(|r| r.success()).count();
        Self {
            total_attempted: results.len(),
            successful,
            failed: results.len() - successful,
            total_cost_usd: results.iter().map(FixAttemptResult::cost_usd).sum(),
            results,
            budget,
            dry_run,
        }
    }
}

impl CommandOutput for BatchOutput {
    fn to_human(&self) -> String {
        let dry_run_note = if self.dry_run {
            " (dry run, files restored)"
        } else {
            ""
        };
        [
            format!(
                "{} of {} file(s) fixed, {} failed, cost {}{dry_run_note}",
                self.successful,
                self.total_attempted,
                self.failed,
                format_usd(self.total_cost_usd)
            ),
            String::new(),
            attempts_table(&self.results).to_string(),
            budget_summary(&self.budget),
        ]
        .join("\n")
    }
}

pub async fn execute(args: BatchArgs, ctx: &AppContext, json_mode: bool) -> Result<ExitCode> {
    let error_context = args.error.unwrap_or_default();
    let targets = args
        .files
        .into_iter()
        .map(|f| FixTarget::new(f, error_context.clone()))
        .collect();

    let results = ctx.engine().fix_many(targets).await;
    ctx.persist_ledger().await?;
    let results = results?;

    let output_data = BatchOutput::new(
        results,
        ctx.ledger().report().await,
        ctx.config.fix.dry_run,
    );
    output(&output_data, json_mode);

    Ok(if output_data.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
