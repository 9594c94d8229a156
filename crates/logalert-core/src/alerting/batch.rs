//! Batch orchestration of one evaluation pass

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::models::{Alert, AlertId, AlertRule, LogEntry, NewAlert};

use super::evaluator::{evaluate_rule, RuleDecision};
use super::resolver::find_alerts_to_auto_resolve;

/// The two write batches produced by a pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationBatches {
    /// Alerts to insert as pending, in rule order
    pub to_create: Vec<NewAlert>,
    /// Alerts to mark resolved and auto-resolved
    pub to_resolve: Vec<AlertId>,
    /// Number of enabled rules that were evaluated
    pub rules_evaluated: usize,
}

/// Evaluate every enabled rule, in input order
pub fn evaluate_decisions(
    rules: &[AlertRule],
    logs: &[LogEntry],
    existing_alerts: &[Alert],
    now: DateTime<Utc>,
) -> Vec<RuleDecision> {
    rules
        .iter()
        .filter(|rule| rule.is_enabled)
        .map(|rule| evaluate_rule(rule, logs, existing_alerts, now))
        .collect()
}

/// Drafts for every enabled rule that triggered outside its cooldown
pub fn evaluate_all_rules(
    rules: &[AlertRule],
    logs: &[LogEntry],
    existing_alerts: &[Alert],
    now: DateTime<Utc>,
) -> Vec<NewAlert> {
    collect_drafts(evaluate_decisions(rules, logs, existing_alerts, now))
}

/// Produce both write batches for a pass.
///
/// `recent_alerts` feeds the cooldown checks; `pending_alerts` are the
/// candidates for auto-resolution.
pub fn evaluate_batch(
    rules: &[AlertRule],
    logs: &[LogEntry],
    recent_alerts: &[Alert],
    pending_alerts: &[Alert],
    now: DateTime<Utc>,
) -> EvaluationBatches {
    let decisions = evaluate_decisions(rules, logs, recent_alerts, now);
    let rules_evaluated = decisions.len();
    let to_create = collect_drafts(decisions);
    let to_resolve = find_alerts_to_auto_resolve(pending_alerts, rules, logs, now);

    debug!(
        rules = rules_evaluated,
        logs = logs.len(),
        to_create = to_create.len(),
        to_resolve = to_resolve.len(),
        "Evaluated batch"
    );

    EvaluationBatches {
        to_create,
        to_resolve,
        rules_evaluated,
    }
}

fn collect_drafts(decisions: Vec<RuleDecision>) -> Vec<NewAlert> {
    decisions
        .into_iter()
        .filter(|decision| decision.should_create_alert)
        .filter_map(|decision| decision.alert)
        .collect()
}
