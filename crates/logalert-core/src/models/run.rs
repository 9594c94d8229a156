//! Evaluation run bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary of one evaluation pass.
///
/// Counts reflect the decisions made in memory, even when persisting them
/// failed; persistence failures are listed in `errors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRun {
    /// Unique identifier
    pub id: Uuid,

    /// The `now` the pass was evaluated at
    pub started_at: DateTime<Utc>,

    /// Number of enabled rules evaluated
    pub rules_evaluated: usize,

    /// Number of alerts the pass decided to create
    pub alerts_created: usize,

    /// Number of alerts the pass decided to auto-resolve
    pub alerts_resolved: usize,

    /// Number of log entries analyzed
    pub logs_analyzed: usize,

    /// Wall-clock duration of the pass
    pub duration_ms: u64,

    /// Set when the pass could not run at all
    pub error: Option<String>,

    /// Persistence failures that did not stop the pass
    #[serde(default)]
    pub errors: Vec<String>,
}

impl EvaluationRun {
    /// Start an empty summary for a pass evaluated at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            started_at: now,
            rules_evaluated: 0,
            alerts_created: 0,
            alerts_resolved: 0,
            logs_analyzed: 0,
            duration_ms: 0,
            error: None,
            errors: Vec::new(),
        }
    }

    /// Whether the pass ran and every batch was persisted
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.errors.is_empty()
    }
}
