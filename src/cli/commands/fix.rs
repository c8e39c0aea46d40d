//! Implementation of the `fixloop fix` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::process::ExitCode;

use crate::cli::context::AppContext;
use crate::cli::output::{attempts_table, budget_summary, format_usd, output, outcome_label, CommandOutput};
use crate::domain::models::{CostReport, FixAttemptResult};

#[derive(Args, Debug)]
pub struct FixArgs {
    /// File to repair, relative to the current directory
    pub filename: String,

    /// Error message or failing test output to guide the fix
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FixOutput {
    pub result: FixAttemptResult,
    pub budget: CostReport,
    pub dry_run: bool,
}

impl CommandOutput for FixOutput {
    fn to_human(&self) -> String {
        let r = &self.result;
        let mut lines = vec![format!(
            "{} {} ({} line(s) changed, cost {})",
            outcome_label(r.success()),
            r.filename(),
            r.lines_changed(),
            format_usd(r.cost_usd()),
        )];
        if self.dry_run {
            lines.push("  dry run: the file was restored after testing".to_string());
        }
        if let Some(error) = r.error() {
            lines.push(format!("  reason: {error}"));
            lines.push(format!("  state:  {}", r.final_state()));
        }
        lines.push(String::new());
        lines.push(attempts_table(std::slice::from_ref(r)).to_string());
        lines.push(budget_summary(&self.budget));
        lines.join("\n")
    }
}

pub async fn execute(args: FixArgs, ctx: &AppContext, json_mode: bool) -> Result<ExitCode> {
    let error_context = args.error.unwrap_or_default();
    let result = ctx.engine().attempt_fix(&args.filename, &error_context).await;
    ctx.persist_ledger().await?;
    let result = result?;

    let success = result.success();
    let output_data = FixOutput {
        result,
        budget: ctx.ledger().report().await,
        dry_run: ctx.config.fix.dry_run,
    };
    output(&output_data, json_mode);

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
