//! Alerting system for LogAlert
//!
//! Decides which rules trigger on a log window, which new alerts are held
//! back by cooldown and which pending alerts can be closed automatically.
//! Everything except [`AlertRunner`] is synchronous and side-effect free.

mod batch;
mod cooldown;
mod evaluator;
mod repository;
mod resolver;
mod runner;
pub mod safe_regex;

#[cfg(test)]
mod fixtures;

pub use batch::{evaluate_all_rules, evaluate_batch, evaluate_decisions, EvaluationBatches};
pub use cooldown::is_in_cooldown;
pub use evaluator::{
    evaluate, evaluate_rule, filter_target_logs, Evaluate, Evaluation, RuleDecision,
    COOLDOWN_REASON, DISABLED_REASON, INVALID_PATTERN_REASON, MAX_SAMPLE_MESSAGES,
};
pub use repository::{AlertRepository, InMemoryAlertRepository};
pub use resolver::find_alerts_to_auto_resolve;
pub use runner::{AlertRunner, PassOutcome};
pub use safe_regex::{is_pattern_safe, safe_create_regex, safe_regex_test, MAX_PATTERN_LENGTH};
