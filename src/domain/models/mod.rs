pub mod batch;
pub mod budget;
pub mod config;
pub mod fix;

pub use batch::{BatchResult, RetryOutcome};
pub use budget::{Affordability, BudgetState, CostReport};
pub use config::{BudgetConfig, CiConfig, Config, FixConfig, LoggingConfig, ProposerConfig};
pub use fix::{count_changed_lines, FixAttemptResult, FixState, FixTarget};
