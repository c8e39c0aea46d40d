//! Budget accounting types used by the cost ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Spend counters for the current day plus the limits they are checked against.
///
/// Only the [`CostLedger`](crate::services::CostLedger) mutates this; everyone
/// else sees copies through `snapshot()` or `report()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetState {
    /// USD spent since `last_reset_date`.
    pub daily_spend: f64,
    /// Number of recorded operations since `last_reset_date`.
    pub operation_count: u64,
    /// Day the counters were last zeroed.
    pub last_reset_date: NaiveDate,
    /// Maximum USD per day.
    pub daily_limit: f64,
    /// Maximum USD for one proposer call.
    pub per_operation_limit: f64,
}

impl BudgetState {
    pub fn new(today: NaiveDate, daily_limit: f64, per_operation_limit: f64) -> Self {
        Self {
            daily_spend: 0.0,
            operation_count: 0,
            last_reset_date: today,
            daily_limit,
            per_operation_limit,
        }
    }

    /// Zero the counters if `today` differs from the stored reset date.
    ///
    /// Returns `true` when a reset happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if today == self.last_reset_date {
            return false;
        }
        self.daily_spend = 0.0;
        self.operation_count = 0;
        self.last_reset_date = today;
        true
    }

    pub fn remaining(&self) -> f64 {
        (self.daily_limit - self.daily_spend).max(0.0)
    }
}

/// Advisory answer to "can this call be paid for?".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Affordability {
    pub allowed: bool,
    pub within_daily: bool,
    pub within_per_operation: bool,
    /// Remaining daily budget before the estimated cost is spent.
    pub remaining: f64,
    pub estimated_cost: f64,
}

impl Affordability {
    /// Human-readable reason for a refusal, `None` when allowed.
    pub fn reason(&self, state: &BudgetState) -> Option<String> {
        if self.allowed {
            return None;
        }
        let mut reasons = Vec::new();
        if !self.within_per_operation {
            reasons.push(format!(
                "estimated ${:.4} exceeds per-operation limit ${:.4}",
                self.estimated_cost, state.per_operation_limit
            ));
        }
        if !self.within_daily {
            reasons.push(format!(
                "estimated ${:.4} exceeds remaining daily budget ${:.4} (limit ${:.2})",
                self.estimated_cost, self.remaining, state.daily_limit
            ));
        }
        Some(reasons.join("; "))
    }
}

/// Derived view of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostReport {
    pub daily_spend: f64,
    pub remaining: f64,
    pub operation_count: u64,
    pub average_cost: f64,
    pub daily_limit: f64,
}

impl CostReport {
    pub fn from_state(state: &BudgetState) -> Self {
        let average_cost = if state.operation_count == 0 {
            0.0
        } else {
            state.daily_spend / state.operation_count as f64
        };
        Self {
            daily_spend: state.daily_spend,
            remaining: state.remaining(),
            operation_count: state.operation_count,
            average_cost,
            daily_limit: state.daily_limit,
        }
    }
}
