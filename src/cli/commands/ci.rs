//! Implementation of the `fixloop ci` command.

use anyhow::Result;
use clap::Args;
use console::style;
use serde::Serialize;
use std::process::ExitCode;

use crate::cli::context::AppContext;
use crate::cli::output::{attempts_table, budget_summary, format_usd, output, truncate, CommandOutput};
use crate::domain::models::{BatchResult, CostReport, RetryOutcome};

#[derive(Args, Debug)]
pub struct CiArgs {
    /// Run a single discovery-and-fix round instead of retrying
    #[arg(long)]
    pub once: bool,

    /// Override ci.max_retries for this run
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_retries: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CiOutput {
    #[serde(flatten)]
    pub outcome: RetryOutcome,
    pub budget: CostReport,
}

fn render_round(number: usize, batch: &BatchResult) -> String {
    let mut lines = vec![format!("{} {number}", style("Round").bold())];

    if batch.tests_passed_initially() {
        lines.push("  tests already passing".to_string());
        return lines.join("\n");
    }
    if let Some(diagnostic) = batch.diagnostic() {
        lines.push(format!("  {}", style(diagnostic).yellow()));
        if let Some(out) = batch.test_output() {
            lines.push(format!("  {}", truncate(out.trim(), 400)));
        }
        return lines.join("\n");
    }

    lines.push(format!(
        "  {} of {} file(s) fixed, cost {}",
        batch.successful(),
        batch.total_attempted(),
        format_usd(batch.total_cost_usd())
    ));
    lines.push(attempts_table(batch.attempted()).to_string());
    match (batch.committed(), batch.git_error()) {
        (Some(true), None) => lines.push("  committed".to_string()),
        (Some(committed), Some(err)) => lines.push(format!(
            "  {} (committed: {committed})",
            style(format!("git: {err}")).red()
        )),
        _ => {}
    }
    lines.join("\n")
}

impl CommandOutput for CiOutput {
    fn to_human(&self) -> String {
        let mut sections: Vec<String> = self
            .outcome
            .rounds
            .iter()
            .enumerate()
            .map(|(i, batch)| render_round(i + 1, batch))
            .collect();

        let verdict = if self.outcome.final_tests_passed {
            style("tests passing").green().bold()
        } else {
            style("tests still failing").red().bold()
        };
        sections.push(format!(
            "{verdict} after {} of {} round(s), {} file(s) fixed",
            self.outcome.attempts,
            self.outcome.max_retries,
            self.outcome.total_fixed()
        ));
        sections.push(budget_summary(&self.budget));
        sections.join("\n\n")
    }
}

pub async fn execute(args: CiArgs, ctx: &AppContext, json_mode: bool) -> Result<ExitCode> {
    let mut ci_config = ctx.config.ci.clone();
    if let Some(max_retries) = args.max_retries {
        ci_config.max_retries = max_retries;
    }
    if args.once {
        ci_config.max_retries = 1;
    }

    let driver = ctx.ci_driver_with(ci_config);
    let outcome = driver.run_with_retries().await;
    ctx.persist_ledger().await?;
    let outcome = outcome?;

    let passed = outcome.final_tests_passed;
    let output_data = CiOutput {
        outcome,
        budget: ctx.ledger().report().await,
    };
    output(&output_data, json_mode);

    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
