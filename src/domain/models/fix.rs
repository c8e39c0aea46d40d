//! Per-file fix attempt model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::AttemptError;

/// States a single fix attempt moves through.
///
/// ```text
/// Idle -> CostChecked -> Proposed -> Applied -> Tested -> Accepted
///                |            |          |           \-> RolledBack
///                \-> Failed   \-> Failed \-> RolledBack (write error)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixState {
    Idle,
    CostChecked,
    Proposed,
    Applied,
    Tested,
    Accepted,
    RolledBack,
    Failed,
}

impl FixState {
    /// Whether `self -> next` is an edge of the attempt state machine.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::CostChecked)
                | (Self::Idle, Self::Failed)
                | (Self::CostChecked, Self::Proposed)
                | (Self::CostChecked, Self::Failed)
                | (Self::Proposed, Self::Applied)
                | (Self::Proposed, Self::Failed)
                | (Self::Applied, Self::Tested)
                | (Self::Applied, Self::RolledBack)
                | (Self::Tested, Self::Accepted)
                | (Self::Tested, Self::RolledBack)
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::RolledBack | Self::Failed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CostChecked => "cost_checked",
            Self::Proposed => "proposed",
            Self::Applied => "applied",
            Self::Tested => "tested",
            Self::Accepted => "accepted",
            Self::RolledBack => "rolled_back",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for FixState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file the caller wants fixed, with the error text that motivates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixTarget {
    pub filename: String,
    pub error_context: String,
}

impl FixTarget {
    pub fn new(filename: impl Into<String>, error_context: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            error_context: error_context.into(),
        }
    }
}

/// Outcome of one Fix Engine attempt. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixAttemptResult {
    id: Uuid,
    success: bool,
    filename: String,
    original_code: String,
    proposed_code: Option<String>,
    lines_changed: usize,
    test_output: String,
    error: Option<AttemptError>,
    final_state: FixState,
    timestamp: DateTime<Utc>,
    model_used: String,
    cost_usd: f64,
}

impl FixAttemptResult {
    /// Tests passed with the proposed code in place.
    pub fn accepted(
        filename: impl Into<String>,
        original_code: String,
        proposed_code: String,
        test_output: String,
        model_used: impl Into<String>,
        cost_usd: f64,
    ) -> Self {
        let lines_changed = count_changed_lines(&original_code, &proposed_code);
        Self {
            id: Uuid::new_v4(),
            success: true,
            filename: filename.into(),
            original_code,
            proposed_code: Some(proposed_code),
            lines_changed,
            test_output,
            error: None,
            final_state: FixState::Accepted,
            timestamp: Utc::now(),
            model_used: model_used.into(),
            cost_usd,
        }
    }

    /// The attempt ended without an accepted patch.
    ///
    /// `final_state` is `RolledBack` when a patch was applied and reverted,
    /// `Failed` when the attempt exited before touching the file.
    #[allow(clippy::too_many_arguments)]
    pub fn failed(
        filename: impl Into<String>,
        original_code: String,
        proposed_code: Option<String>,
        test_output: String,
        error: AttemptError,
        final_state: FixState,
        model_used: impl Into<String>,
        cost_usd: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            success: false,
            filename: filename.into(),
            original_code,
            proposed_code,
            lines_changed: 0,
            test_output,
            error: Some(error),
            final_state,
            timestamp: Utc::now(),
            model_used: model_used.into(),
            cost_usd,
        }
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub const fn success(&self) -> bool {
        self.success
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn original_code(&self) -> &str {
        &self.original_code
    }

    pub fn proposed_code(&self) -> Option<&str> {
        self.proposed_code.as_deref()
    }

    pub const fn lines_changed(&self) -> usize {
        self.lines_changed
    }

    pub fn test_output(&self) -> &str {
        &self.test_output
    }

    pub const fn error(&self) -> Option<&AttemptError> {
        self.error.as_ref()
    }

    pub const fn final_state(&self) -> FixState {
        self.final_state
    }

    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn model_used(&self) -> &str {
        &self.model_used
    }

    pub const fn cost_usd(&self) -> f64 {
        self.cost_usd
    }
}

/// Count line positions where `before` and `after` differ.
///
/// Compares position by position over the longer of the two line sequences;
/// lines present in only one of them count as changed.
pub fn count_changed_lines(before: &str, after: &str) -> usize {
    let old: Vec<&str> = before.lines().collect();
    let new: Vec<&str> = after.lines().collect();
    let longest = old.len().max(new.len());

    (0..longest)
        .filter(|&i| old.get(i) != new.get(i))
        .count()
}
