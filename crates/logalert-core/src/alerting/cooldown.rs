//! Cooldown suppression

use chrono::{DateTime, Duration, Utc};

use crate::models::{Alert, AlertRule};

/// Whether `rule` created an alert within its cooldown window before `now`.
///
/// Measured from alert creation, whatever the alert's current status. An
/// alert created exactly `cooldown_minutes` ago still counts. A zero
/// cooldown never suppresses.
pub fn is_in_cooldown(rule: &AlertRule, existing_alerts: &[Alert], now: DateTime<Utc>) -> bool {
    if rule.cooldown_minutes == 0 {
        return false;
    }

    let cutoff = now - Duration::minutes(i64::from(rule.cooldown_minutes));

    existing_alerts
        .iter()
        .any(|alert| alert.rule_id == Some(rule.id) && alert.created_at >= cutoff)
}
