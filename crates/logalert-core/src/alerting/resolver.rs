//! Auto-resolution of alerts whose condition has cleared

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Alert, AlertId, AlertRule, LogEntry};

use super::evaluator::evaluate_rule;

/// Select the pending alerts whose rule no longer triggers on `logs`.
///
/// Alerts that are not pending, have no rule, or reference a rule missing
/// from `rules` are left alone. A disabled rule no longer triggers, so its
/// pending alerts are resolved. Rules are re-evaluated without alert
/// history, so cooldown never masks a cleared condition. The result keeps
/// the order of `pending_alerts`.
pub fn find_alerts_to_auto_resolve(
    pending_alerts: &[Alert],
    rules: &[AlertRule],
    logs: &[LogEntry],
    now: DateTime<Utc>,
) -> Vec<AlertId> {
    let rules_by_id: HashMap<Uuid, &AlertRule> = rules.iter().map(|rule| (rule.id, rule)).collect();
    let mut still_triggered: HashMap<Uuid, bool> = HashMap::new();

    pending_alerts
        .iter()
        .filter(|alert| alert.is_pending())
        .filter_map(|alert| {
            let Some(rule_id) = alert.rule_id else {
                debug!(alert_id = %alert.id, "Alert has no rule, skipping auto-resolution");
                return None;
            };
            let Some(rule) = rules_by_id.get(&rule_id) else {
                debug!(alert_id = %alert.id, rule_id = %rule_id, "Alert references unknown rule");
                return None;
            };

            let triggered = *still_triggered
                .entry(rule_id)
                .or_insert_with(|| evaluate_rule(rule, logs, &[], now).triggered);

            if triggered {
                None
            } else {
                debug!(alert_id = %alert.id, rule_id = %rule_id, "Condition cleared");
                Some(alert.id)
            }
        })
        .collect()
}
