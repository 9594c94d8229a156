//! Builders shared by the alerting tests

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::models::{
    Alert, AlertContext, AlertRule, AlertStatus, ErrorPatternConfig, ErrorRateConfig,
    FunctionHealthConfig, LogEntry, LogLevel, RuleConfig, Severity,
};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn log(level: LogLevel, function: &str, ago: Duration, message: &str) -> LogEntry {
    LogEntry::new(now() - ago, level, function, message)
}

pub fn error(function: &str, ago: Duration, message: &str) -> LogEntry {
    log(LogLevel::Error, function, ago, message)
}

pub fn info(function: &str, ago: Duration, message: &str) -> LogEntry {
    log(LogLevel::Info, function, ago, message)
}

/// `count` errors from `function`, one per minute going back from `now`
pub fn errors(function: &str, count: usize) -> Vec<LogEntry> {
    (0..count)
        .map(|i| {
            let minutes = i64::try_from(i).unwrap();
            error(function, Duration::minutes(minutes), &format!("failure {i}"))
        })
        .collect()
}

pub fn rule(config: RuleConfig) -> AlertRule {
    AlertRule {
        id: Uuid::new_v4(),
        name: "test rule".to_string(),
        description: None,
        config,
        target_functions: None,
        severity: Severity::Warning,
        cooldown_minutes: 0,
        is_enabled: true,
    }
}

pub fn error_rate_rule(threshold: u32, window_minutes: u32) -> AlertRule {
    rule(RuleConfig::ErrorRate(ErrorRateConfig {
        threshold,
        window_minutes,
        error_pattern: None,
    }))
}

pub fn pattern_rule(pattern: &str, case_sensitive: bool) -> AlertRule {
    rule(RuleConfig::ErrorPattern(ErrorPatternConfig {
        pattern: pattern.to_string(),
        case_sensitive,
    }))
}

pub fn health_rule(consecutive_failures: u32) -> AlertRule {
    rule(RuleConfig::FunctionHealth(FunctionHealthConfig {
        consecutive_failures,
    }))
}

pub fn alert_for(rule_id: Option<Uuid>, created_at: DateTime<Utc>) -> Alert {
    Alert {
        id: Uuid::new_v4(),
        rule_id,
        title: "existing".to_string(),
        message: "existing alert".to_string(),
        severity: Severity::Warning,
        context: AlertContext::default(),
        status: AlertStatus::Pending,
        acknowledged_at: None,
        acknowledged_by: None,
        resolved_at: None,
        auto_resolved: false,
        created_at,
        updated_at: created_at,
    }
}
