//! Implementation of the `fixloop budget` command.

use anyhow::Result;
use comfy_table::Cell;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{format_usd, list_table, output, CommandOutput};
use crate::domain::models::CostReport;

#[derive(Debug, Serialize)]
pub struct BudgetOutput {
    #[serde(flatten)]
    pub report: CostReport,
    pub per_operation_limit: f64,
    pub persisted: bool,
}

impl CommandOutput for BudgetOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["metric", "value"]);
        table.add_row(vec![Cell::new("spent today"), Cell::new(format_usd(self.report.daily_spend))]);
        table.add_row(vec![Cell::new("daily limit"), Cell::new(format_usd(self.report.daily_limit))]);
        table.add_row(vec![Cell::new("remaining"), Cell::new(format_usd(self.report.remaining))]);
        table.add_row(vec![
            Cell::new("per-operation limit"),
            Cell::new(format_usd(self.per_operation_limit)),
        ]);
        table.add_row(vec![Cell::new("operations"), Cell::new(self.report.operation_count)]);
        table.add_row(vec![Cell::new("average cost"), Cell::new(format_usd(self.report.average_cost))]);

        let mut rendered = table.to_string();
        if !self.persisted {
            rendered.push_str("\n\nNo budget.state_file configured; spend is only tracked per run.");
        }
        rendered
    }
}

pub async fn execute(ctx: &AppContext, json_mode: bool) -> Result<()> {
    let output_data = BudgetOutput {
        report: ctx.ledger().report().await,
        per_operation_limit: ctx.config.budget.per_operation_limit_usd,
        persisted: ctx.config.budget.state_file.is_some(),
    };
    output(&output_data, json_mode);
    Ok(())
}
