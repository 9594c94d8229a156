//! Alert rule evaluation engine

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{
    Alert, AlertContext, AlertRule, ErrorPatternConfig, ErrorRateConfig, FunctionHealthConfig,
    LogEntry, NewAlert, RuleConfig,
};

use super::cooldown::is_in_cooldown;
use super::safe_regex::{safe_create_regex, safe_regex_test};

/// Maximum number of sample messages carried in an alert context
pub const MAX_SAMPLE_MESSAGES: usize = 5;

/// Reason given when an `error_pattern` rule's regex cannot be used
pub const INVALID_PATTERN_REASON: &str = "Invalid or unsafe regex pattern";

/// Reason given when a triggered rule is suppressed by its cooldown
pub const COOLDOWN_REASON: &str = "Skipped due to cooldown";

/// Reason given for a rule with `is_enabled = false`
pub const DISABLED_REASON: &str = "Rule is disabled";

/// Outcome of running one rule type against a log set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Whether the rule condition holds
    pub triggered: bool,
    /// Draft alert, present when triggered
    pub alert: Option<NewAlert>,
    /// Why the rule did or did not trigger
    pub reason: String,
}

impl Evaluation {
    fn triggered(alert: NewAlert, reason: String) -> Self {
        Self {
            triggered: true,
            alert: Some(alert),
            reason,
        }
    }

    fn quiet(reason: impl Into<String>) -> Self {
        Self {
            triggered: false,
            alert: None,
            reason: reason.into(),
        }
    }
}

/// Decision for one rule after target filtering and cooldown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDecision {
    /// Rule the decision is about
    pub rule_id: Uuid,
    /// Whether the rule condition holds, regardless of cooldown
    pub triggered: bool,
    /// Whether a new alert should be persisted
    pub should_create_alert: bool,
    /// Draft alert; withheld when the rule is in cooldown
    pub alert: Option<NewAlert>,
    /// Why the rule did or did not trigger
    pub reason: String,
}

/// A rule type that can be checked against a set of log entries.
///
/// `logs` are already restricted to the rule's target functions.
pub trait Evaluate {
    /// Check the condition for `rule` at `now`
    fn evaluate(&self, rule: &AlertRule, logs: &[&LogEntry], now: DateTime<Utc>) -> Evaluation;
}

impl Evaluate for RuleConfig {
    fn evaluate(&self, rule: &AlertRule, logs: &[&LogEntry], now: DateTime<Utc>) -> Evaluation {
        match self {
            Self::ErrorRate(config) => config.evaluate(rule, logs, now),
            Self::ErrorPattern(config) => config.evaluate(rule, logs, now),
            Self::FunctionHealth(config) => config.evaluate(rule, logs, now),
        }
    }
}

impl Evaluate for ErrorRateConfig {
    fn evaluate(&self, rule: &AlertRule, logs: &[&LogEntry], now: DateTime<Utc>) -> Evaluation {
        let window_start = now - Duration::minutes(i64::from(self.window_minutes));

        let mut errors: Vec<&LogEntry> = logs
            .iter()
            .copied()
            .filter(|entry| {
                entry.is_error() && entry.timestamp >= window_start && entry.timestamp <= now
            })
            .collect();

        if let Some(pattern) = &self.error_pattern {
            match safe_create_regex(pattern, "i") {
                Some(regex) => errors.retain(|entry| safe_regex_test(&regex, &entry.message)),
                None => warn!(
                    rule_id = %rule.id,
                    pattern = %pattern,
                    "Ignoring invalid or unsafe error_pattern filter, counting all errors"
                ),
            }
        }

        let count = errors.len();
        if (count as u64) < u64::from(self.threshold) {
            return Evaluation::quiet(format!(
                "{count} errors in the last {} minutes, below threshold of {}",
                self.window_minutes, self.threshold
            ));
        }

        let function_names = affected_functions(&errors);
        let alert = NewAlert {
            rule_id: Some(rule.id),
            title: format!(
                "{}: {count} errors in {} minutes",
                rule.name, self.window_minutes
            ),
            message: format!(
                "{count} errors in the last {} minutes (threshold: {}) in {}",
                self.window_minutes,
                self.threshold,
                describe_functions(&function_names)
            ),
            severity: rule.severity,
            context: AlertContext {
                function_names,
                error_count: Some(count),
                sample_messages: sample_messages(errors.iter().copied()),
                window_start: Some(window_start),
                window_end: Some(now),
                ..AlertContext::default()
            },
        };

        Evaluation::triggered(
            alert,
            format!(
                "{count} errors in the last {} minutes (threshold: {})",
                self.window_minutes, self.threshold
            ),
        )
    }
}

impl Evaluate for ErrorPatternConfig {
    fn evaluate(&self, rule: &AlertRule, logs: &[&LogEntry], _now: DateTime<Utc>) -> Evaluation {
        let flags = if self.case_sensitive { "" } else { "i" };

        let Some(regex) = safe_create_regex(&self.pattern, flags) else {
            warn!(rule_id = %rule.id, pattern = %self.pattern, "Rule pattern rejected");
            return Evaluation::quiet(INVALID_PATTERN_REASON);
        };

        let matches: Vec<&LogEntry> = logs
            .iter()
            .copied()
            .filter(|entry| entry.is_error() && safe_regex_test(&regex, &entry.message))
            .collect();

        if matches.is_empty() {
            return Evaluation::quiet(format!("No errors matched pattern \"{}\"", self.pattern));
        }

        let count = matches.len();
        let function_names = affected_functions(&matches);
        let alert = NewAlert {
            rule_id: Some(rule.id),
            title: format!("{}: pattern matched {count} errors", rule.name),
            message: format!(
                "Pattern \"{}\" matched {count} error messages in {}",
                self.pattern,
                describe_functions(&function_names)
            ),
            severity: rule.severity,
            context: AlertContext {
                function_names,
                error_count: Some(count),
                sample_messages: sample_messages(matches.iter().copied()),
                pattern: Some(self.pattern.clone()),
                ..AlertContext::default()
            },
        };

        Evaluation::triggered(
            alert,
            format!("{count} errors matched pattern \"{}\"", self.pattern),
        )
    }
}

impl Evaluate for FunctionHealthConfig {
    fn evaluate(&self, rule: &AlertRule, logs: &[&LogEntry], _now: DateTime<Utc>) -> Evaluation {
        let required = self.consecutive_failures as usize;

        let mut by_function: BTreeMap<&str, Vec<&LogEntry>> = BTreeMap::new();
        for entry in logs.iter().copied() {
            by_function
                .entry(entry.function_name.as_str())
                .or_default()
                .push(entry);
        }

        let mut longest_overall = 0;
        let mut failing: Vec<(&str, Vec<&LogEntry>)> = Vec::new();

        for (function, mut entries) in by_function {
            entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            let streak: Vec<&LogEntry> = entries
                .into_iter()
                .take_while(|entry| entry.is_error())
                .collect();

            longest_overall = longest_overall.max(streak.len());
            if streak.len() >= required {
                failing.push((function, streak));
            }
        }

        if failing.is_empty() {
            return Evaluation::quiet(format!(
                "No function reached {required} consecutive failures (longest streak: {longest_overall})"
            ));
        }

        let longest = failing
            .iter()
            .map(|(_, streak)| streak.len())
            .max()
            .unwrap_or_default();
        let function_names: Vec<String> = failing
            .iter()
            .map(|(function, _)| (*function).to_string())
            .collect();
        let samples = sample_messages(failing.iter().flat_map(|(_, streak)| streak.iter().copied()));

        let alert = NewAlert {
            rule_id: Some(rule.id),
            title: format!(
                "{}: {} function(s) failing consecutively",
                rule.name,
                function_names.len()
            ),
            message: format!(
                "{} failed up to {longest} times in a row (threshold: {required})",
                describe_functions(&function_names)
            ),
            severity: rule.severity,
            context: AlertContext {
                function_names,
                consecutive_failures: Some(longest),
                sample_messages: samples,
                ..AlertContext::default()
            },
        };

        Evaluation::triggered(
            alert,
            format!("{} function(s) with at least {required} consecutive failures", failing.len()),
        )
    }
}

/// Restrict `logs` to the functions a rule targets
pub fn filter_target_logs<'a>(rule: &AlertRule, logs: &'a [LogEntry]) -> Vec<&'a LogEntry> {
    logs.iter()
        .filter(|entry| rule.targets(&entry.function_name))
        .collect()
}

/// Run a rule's type-specific check. Cooldown is not considered.
pub fn evaluate(rule: &AlertRule, logs: &[&LogEntry], now: DateTime<Utc>) -> Evaluation {
    rule.config.evaluate(rule, logs, now)
}

/// Evaluate a single rule against the log set, applying target filtering
/// and cooldown. A disabled rule never triggers.
pub fn evaluate_rule(
    rule: &AlertRule,
    logs: &[LogEntry],
    existing_alerts: &[Alert],
    now: DateTime<Utc>,
) -> RuleDecision {
    if !rule.is_enabled {
        debug!(rule_id = %rule.id, "Rule disabled");
        return RuleDecision {
            rule_id: rule.id,
            triggered: false,
            should_create_alert: false,
            alert: None,
            reason: DISABLED_REASON.to_string(),
        };
    }

    let scoped = filter_target_logs(rule, logs);
    let evaluation = evaluate(rule, &scoped, now);

    debug!(
        rule_id = %rule.id,
        rule_type = %rule.rule_type(),
        logs = scoped.len(),
        triggered = evaluation.triggered,
        reason = %evaluation.reason,
        "Evaluated rule"
    );

    if evaluation.triggered && is_in_cooldown(rule, existing_alerts, now) {
        debug!(
            rule_id = %rule.id,
            cooldown_minutes = rule.cooldown_minutes,
            "Rule in cooldown"
        );
        return RuleDecision {
            rule_id: rule.id,
            triggered: true,
            should_create_alert: false,
            alert: None,
            reason: COOLDOWN_REASON.to_string(),
        };
    }

    RuleDecision {
        rule_id: rule.id,
        triggered: evaluation.triggered,
        should_create_alert: evaluation.triggered,
        alert: evaluation.alert,
        reason: evaluation.reason,
    }
}

fn affected_functions(entries: &[&LogEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| entry.function_name.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn sample_messages<'a>(entries: impl Iterator<Item = &'a LogEntry>) -> Vec<String> {
    entries
        .take(MAX_SAMPLE_MESSAGES)
        .map(|entry| entry.message.clone())
        .collect()
}

fn describe_functions(functions: &[String]) -> String {
    if functions.is_empty() {
        "no functions".to_string()
    } else {
        functions.join(", ")
    }
}
