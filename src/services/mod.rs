//! Service layer: the repair engine and the pieces it is built from.

pub mod ci_driver;
pub mod cost_ledger;
pub mod failure_locator;
pub mod fix_engine;
pub mod normalize;

pub use ci_driver::CiDriver;
pub use cost_ledger::{
    cheapest_pricing, cost_from_usage, estimate_cost, estimate_tokens, get_model_pricing,
    CostLedger, ModelPricing,
};
pub use failure_locator::{is_test_file, path_key, FailureLocator, LocatorRules};
pub use fix_engine::{FixEngine, DEFAULT_ERROR_CONTEXT};
pub use normalize::normalize_proposal;
