//! Model-aware cost estimation and daily budget accounting.
//!
//! The ledger is advisory: callers ask [`CostLedger::can_afford`] before an
//! expensive proposer call and [`CostLedger::record`] afterwards. It never
//! refuses a record, and it never performs I/O.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::models::{Affordability, BudgetConfig, BudgetState, CostReport};
use crate::domain::ports::{Clock, TokenUsage};

/// Pricing per million tokens for a specific model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// Cost per million input tokens (USD).
    pub input: f64,
    /// Cost per million output tokens (USD).
    pub output: f64,
}

/// Known model pricing table (costs in USD per million tokens).
///
/// Order matters: the first substring match wins, so more specific names
/// come before their prefixes.
const PRICING_TABLE: &[(&str, ModelPricing)] = &[
    ("opus", ModelPricing { input: 15.0, output: 75.0 }),
    ("sonnet", ModelPricing { input: 3.0, output: 15.0 }),
    ("haiku", ModelPricing { input: 0.80, output: 4.0 }),
    ("gpt-4o-mini", ModelPricing { input: 0.15, output: 0.60 }),
    ("gpt-4o", ModelPricing { input: 2.50, output: 10.0 }),
];

/// Rough characters-per-token ratio for source code.
const CHARS_PER_TOKEN: u64 = 4;

/// Get pricing for a model by name or alias.
///
/// Matches against known model name substrings (e.g. "sonnet" matches
/// "claude-sonnet-4-5-20250929").
pub fn get_model_pricing(model: &str) -> Option<ModelPricing> {
    let model_lower = model.to_lowercase();
    PRICING_TABLE
        .iter()
        .find(|(name, _)| model_lower.contains(name))
        .map(|(_, pricing)| *pricing)
}

/// The least expensive tier in the table, used for unknown models.
pub fn cheapest_pricing() -> ModelPricing {
    PRICING_TABLE
        .iter()
        .map(|(_, pricing)| *pricing)
        .min_by(|a, b| {
            (a.input + a.output)
                .partial_cmp(&(b.input + b.output))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(ModelPricing { input: 0.0, output: 0.0 })
}

fn pricing_or_cheapest(model: &str) -> ModelPricing {
    get_model_pricing(model).unwrap_or_else(|| {
        tracing::debug!(model, "unknown model, pricing at cheapest tier");
        cheapest_pricing()
    })
}

/// Approximate token count for `chars` characters of input.
pub const fn estimate_tokens(chars: usize) -> u64 {
    (chars as u64).div_ceil(CHARS_PER_TOKEN)
}

/// Worst-case USD cost of one call: full input plus every allowed output token.
pub fn estimate_cost(model: &str, input_size: usize, max_output_tokens: u32) -> f64 {
    let pricing = pricing_or_cheapest(model);
    (estimate_tokens(input_size) as f64 * pricing.input
        + f64::from(max_output_tokens) * pricing.output)
        / 1_000_000.0
}

/// USD cost of a completed call from the usage the backend reported.
pub fn cost_from_usage(model: &str, usage: TokenUsage) -> f64 {
    let pricing = pricing_or_cheapest(model);
    (usage.input_tokens as f64 * pricing.input + usage.output_tokens as f64 * pricing.output)
        / 1_000_000.0
}

/// Daily spend ledger shared by every attempt in the process.
///
/// Cloning is cheap and clones share the same counters.
#[derive(Clone)]
pub struct CostLedger {
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<BudgetState>>,
}

impl CostLedger {
    /// Fresh ledger with zeroed counters for today.
    pub fn new(config: &BudgetConfig, clock: Arc<dyn Clock>) -> Self {
        let state = BudgetState::new(
            clock.today(),
            config.daily_limit_usd,
            config.per_operation_limit_usd,
        );
        Self::from_state(state, clock)
    }

    /// Resume from a previously saved state.
    ///
    /// Limits always come from `config`; only the counters are carried over.
    pub fn restore(mut state: BudgetState, config: &BudgetConfig, clock: Arc<dyn Clock>) -> Self {
        state.daily_limit = config.daily_limit_usd;
        state.per_operation_limit = config.per_operation_limit_usd;
        Self::from_state(state, clock)
    }

    pub fn from_state(state: BudgetState, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// See [`estimate_cost`].
    pub fn estimate(&self, model: &str, input_size: usize, max_output_tokens: u32) -> f64 {
        estimate_cost(model, input_size, max_output_tokens)
    }

    /// Check `estimated_cost` against both limits after a lazy day rollover.
    pub async fn can_afford(&self, estimated_cost: f64) -> Affordability {
        let mut state = self.state.lock().await;
        self.roll_over(&mut state);
        affordability(&state, estimated_cost)
    }

    /// Like [`can_afford`](Self::can_afford), but returns the refusal reason.
    /// Verdict and reason come from the same locked snapshot.
    pub async fn check(&self, estimated_cost: f64) -> Result<Affordability, String> {
        let mut state = self.state.lock().await;
        self.roll_over(&mut state);
        let verdict = affordability(&state, estimated_cost);
        match verdict.reason(&state) {
            None => Ok(verdict),
            Some(reason) => Err(reason),
        }
    }

    /// Add spend. Never rejects; negative input counts as zero.
    pub async fn record(&self, actual_cost: f64) {
        let cost = if actual_cost.is_finite() && actual_cost >= 0.0 {
            actual_cost
        } else {
            tracing::warn!(actual_cost, "ignoring invalid cost, recording zero");
            0.0
        };

        let mut state = self.state.lock().await;
        self.roll_over(&mut state);
        state.daily_spend += cost;
        state.operation_count += 1;

        tracing::debug!(
            cost_usd = cost,
            daily_spend = state.daily_spend,
            operation_count = state.operation_count,
            "recorded spend"
        );
    }

    pub async fn report(&self) -> CostReport {
        let mut state = self.state.lock().await;
        self.roll_over(&mut state);
        CostReport::from_state(&state)
    }

    /// Copy of the raw state, for persistence.
    pub async fn snapshot(&self) -> BudgetState {
        self.state.lock().await.clone()
    }

    fn roll_over(&self, state: &mut BudgetState) {
        let today = self.clock.today();
        let previous = state.last_reset_date;
        if state.roll_over(today) {
            tracing::info!(%previous, %today, "new day, budget counters reset");
        }
    }
}

fn affordability(state: &BudgetState, estimated_cost: f64) -> Affordability {
    let within_per_operation = estimated_cost <= state.per_operation_limit;
    let within_daily = state.daily_spend + estimated_cost <= state.daily_limit;

    Affordability {
        allowed: within_per_operation && within_daily,
        within_daily,
        within_per_operation,
        remaining: state.remaining(),
        estimated_cost,
    }
}

impl std::fmt::Debug for CostLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostLedger").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Mutex as StdMutex;

    struct ManualClock(StdMutex<NaiveDate>);

    impl ManualClock {
        fn at(y: i32, m: u32, d: u32) -> Arc<Self> {
            Arc::new(Self(StdMutex::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())))
        }

        fn advance_day(&self) {
            let mut date = self.0.lock().unwrap();
            *date = date.succ_opt().unwrap();
        }
    }

    impl Clock for ManualClock {
        fn today(&self) -> NaiveDate {
            *self.0.lock().unwrap()
        }
    }

    fn budget(daily: f64, per_op: f64) -> BudgetConfig {
        BudgetConfig {
            daily_limit_usd: daily,
            per_operation_limit_usd: per_op,
            state_file: None,
        }
    }

    #[test]
    fn test_get_model_pricing_full_name() {
        let pricing = get_model_pricing("claude-opus-4-6-20250616").unwrap();
        assert_eq!(pricing.input, 15.0);
    }

    #[test]
    fn test_specific_names_win_over_prefixes() {
        let pricing = get_model_pricing("gpt-4o-mini-2024-07-18").unwrap();
        assert_eq!(pricing.input, 0.15);
    }

    #[test]
    fn test_unknown_model_uses_cheapest_tier() {
        let cheapest = cheapest_pricing();
        assert_eq!(cheapest.input, 0.15);
        let unknown = estimate_cost("mystery-model", 4_000, 1_000);
        let mini = estimate_cost("gpt-4o-mini", 4_000, 1_000);
        assert!((unknown - mini).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_cost_input_and_output() {
        // 4M chars = 1M tokens of sonnet input ($3) + 1M output tokens ($15)
        let cost = estimate_cost("sonnet", 4_000_000, 1_000_000);
        assert!((cost - 18.0).abs() < 0.001);
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(0), 0);
        assert_eq!(estimate_tokens(1), 1);
        assert_eq!(estimate_tokens(8), 2);
        assert_eq!(estimate_tokens(9), 3);
    }

    #[test]
    fn test_cost_from_usage() {
        let usage = TokenUsage {
            input_tokens: 10_000,
            output_tokens: 5_000,
        };
        // 10K * 15 / 1M + 5K * 75 / 1M = 0.15 + 0.375
        assert!((cost_from_usage("opus", usage) - 0.525).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_can_afford_respects_both_limits() {
        let ledger = CostLedger::new(&budget(1.0, 0.5), ManualClock::at(2026, 1, 5));

        let ok = ledger.can_afford(0.4).await;
        assert!(ok.allowed);
        assert_eq!(ok.remaining, 1.0);

        let too_big = ledger.can_afford(0.6).await;
        assert!(!too_big.allowed);
        assert!(!too_big.within_per_operation);
        assert!(too_big.within_daily);

        ledger.record(0.8).await;
        let over_daily = ledger.can_afford(0.3).await;
        assert!(!over_daily.allowed);
        assert!(over_daily.within_per_operation);
        assert!(!over_daily.within_daily);
    }

    #[tokio::test]
    async fn test_exact_limit_is_allowed() {
        let ledger = CostLedger::new(&budget(1.0, 1.0), ManualClock::at(2026, 1, 5));
        ledger.record(0.75).await;
        assert!(ledger.can_afford(0.25).await.allowed);
    }

    #[tokio::test]
    async fn test_check_returns_reason() {
        let ledger = CostLedger::new(&budget(1.0, 0.1), ManualClock::at(2026, 1, 5));
        let reason = ledger.check(0.2).await.unwrap_err();
        assert!(reason.contains("per-operation"));
        assert!(ledger.check(0.05).await.is_ok());
    }

    #[tokio::test]
    async fn test_record_never_rejects() {
        let ledger = CostLedger::new(&budget(1.0, 1.0), ManualClock::at(2026, 1, 5));
        ledger.record(5.0).await;
        let report = ledger.report().await;
        assert_eq!(report.daily_spend, 5.0);
        assert_eq!(report.remaining, 0.0);
        assert_eq!(report.operation_count, 1);
    }

    #[tokio::test]
    async fn test_negative_cost_recorded_as_zero() {
        let ledger = CostLedger::new(&budget(1.0, 1.0), ManualClock::at(2026, 1, 5));
        ledger.record(-1.0).await;
        let report = ledger.report().await;
        assert_eq!(report.daily_spend, 0.0);
        assert_eq!(report.operation_count, 1);
    }

    #[tokio::test]
    async fn test_report_average() {
        let ledger = CostLedger::new(&budget(10.0, 1.0), ManualClock::at(2026, 1, 5));
        assert_eq!(ledger.report().await.average_cost, 0.0);

        ledger.record(0.2).await;
        ledger.record(0.4).await;
        let report = ledger.report().await;
        assert!((report.average_cost - 0.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_day_rollover_is_lazy() {
        let clock = ManualClock::at(2026, 1, 5);
        let ledger = CostLedger::new(&budget(1.0, 1.0), clock.clone());
        ledger.record(0.9).await;
        assert!(!ledger.can_afford(0.2).await.allowed);

        clock.advance_day();
        // Nothing reset until the ledger is consulted.
        assert_eq!(ledger.snapshot().await.daily_spend, 0.9);

        let verdict = ledger.can_afford(0.2).await;
        assert!(verdict.allowed);
        let state = ledger.snapshot().await;
        assert_eq!(state.daily_spend, 0.0);
        assert_eq!(state.operation_count, 0);
        assert_eq!(state.last_reset_date, NaiveDate::from_ymd_opt(2026, 1, 6).unwrap());
    }

    #[tokio::test]
    async fn test_restore_keeps_counters_and_takes_new_limits() {
        let clock = ManualClock::at(2026, 1, 5);
        let mut saved = BudgetState::new(clock.today(), 1.0, 1.0);
        saved.daily_spend = 0.5;
        saved.operation_count = 2;

        let ledger = CostLedger::restore(saved, &budget(20.0, 2.0), clock);
        let state = ledger.snapshot().await;
        assert_eq!(state.daily_spend, 0.5);
        assert_eq!(state.operation_count, 2);
        assert_eq!(state.daily_limit, 20.0);
        assert_eq!(state.per_operation_limit, 2.0);
    }

    #[tokio::test]
    async fn test_concurrent_records_are_not_lost() {
        let ledger = CostLedger::new(&budget(1_000.0, 1.0), ManualClock::at(2026, 1, 5));
        let handles: Vec<_> = (0..50)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.record(0.01).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        let report = ledger.report().await;
        assert_eq!(report.operation_count, 50);
        assert!((report.daily_spend - 0.5).abs() < 1e-9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_check_verdict_and_reason_agree_under_concurrent_records() {
        let ledger = CostLedger::new(&budget(0.5, 1.0), ManualClock::at(2026, 1, 5));
        let handles: Vec<_> = (0..100)
            .map(|i| {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        ledger.record(0.01).await;
                        None
                    } else {
                        Some(ledger.check(0.1).await)
                    }
                })
            })
            .collect();

        for handle in handles {
            match handle.await.unwrap() {
                Some(Ok(verdict)) => {
                    assert!(verdict.allowed);
                    assert!(verdict.remaining >= 0.1 - 1e-9);
                }
                Some(Err(reason)) => {
                    assert!(reason.contains("remaining daily budget"), "{reason}");
                }
                None => {}
            }
        }
    }
}
