//! Output formatting utilities for the CLI.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::{style, StyledObject};
use serde::Serialize;

use crate::domain::models::{CostReport, FixAttemptResult};

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&result.to_json()).unwrap_or_default()
        );
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to a maximum number of characters, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Create a standard list table with the given headers.
///
/// Uses the NOTHING preset (no borders) for a clean CLI aesthetic.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Colored label for a fix outcome.
pub fn outcome_label(success: bool) -> StyledObject<&'static str> {
    if success {
        style("fixed").green().bold()
    } else {
        style("failed").red().bold()
    }
}

pub fn format_usd(amount: f64) -> String {
    format!("${amount:.4}")
}

/// One row per attempt: file, outcome, lines changed, cost, reason.
pub fn attempts_table(attempts: &[FixAttemptResult]) -> Table {
    let mut table = list_table(&["file", "result", "lines", "cost", "detail"]);
    for attempt in attempts {
        let detail = attempt
            .error()
            .map(|e| truncate(&e.to_string(), 60))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(attempt.filename()),
            Cell::new(outcome_label(attempt.success())),
            Cell::new(attempt.lines_changed()),
            Cell::new(format_usd(attempt.cost_usd())),
            Cell::new(detail),
        ]);
    }
    table
}

/// Spend summary lines shared by several commands.
pub fn budget_summary(report: &CostReport) -> String {
    format!(
        "Spent today: {} of {} ({} remaining, {} operation(s), avg {})",
        style(format_usd(report.daily_spend)).bold(),
        format_usd(report.daily_limit),
        format_usd(report.remaining),
        report.operation_count,
        format_usd(report.average_cost),
    )
}
