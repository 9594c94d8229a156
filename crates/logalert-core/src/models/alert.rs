//! Alert data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a stored alert
pub type AlertId = Uuid;

/// Alert severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational
    Info,
    /// Warning
    #[default]
    Warning,
    /// Critical
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Status of a stored alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// Alert is open and nobody has looked at it yet
    #[default]
    Pending,
    /// Alert has been acknowledged
    Acknowledged,
    /// Alert has been resolved
    Resolved,
}

/// Diagnostic payload attached to an alert.
///
/// Counts always describe the exact log subset that caused the trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertContext {
    /// Affected functions, sorted and unique
    #[serde(default)]
    pub function_names: Vec<String>,

    /// Number of matching error entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_count: Option<usize>,

    /// Longest consecutive-failure streak among the affected functions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consecutive_failures: Option<usize>,

    /// Up to five example messages
    #[serde(default)]
    pub sample_messages: Vec<String>,

    /// Pattern that matched, as configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Start of the evaluated window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_start: Option<DateTime<Utc>>,

    /// End of the evaluated window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_end: Option<DateTime<Utc>>,
}

/// A stored alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique identifier
    pub id: AlertId,

    /// Rule that created this alert; alerts may outlive or predate rules
    pub rule_id: Option<Uuid>,

    /// Short summary
    pub title: String,

    /// Human-readable message
    pub message: String,

    /// Severity level
    pub severity: Severity,

    /// Diagnostic payload
    #[serde(default)]
    pub context: AlertContext,

    /// Current status
    #[serde(default)]
    pub status: AlertStatus,

    /// When a human acknowledged the alert
    #[serde(default)]
    pub acknowledged_at: Option<DateTime<Utc>>,

    /// Who acknowledged the alert
    #[serde(default)]
    pub acknowledged_by: Option<String>,

    /// When the alert was resolved
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,

    /// Whether the engine resolved the alert on its own
    #[serde(default)]
    pub auto_resolved: bool,

    /// When the alert was created
    pub created_at: DateTime<Utc>,

    /// When the alert was last updated
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// Whether the alert is still waiting for attention
    pub fn is_pending(&self) -> bool {
        self.status == AlertStatus::Pending
    }

    /// Close the alert because its condition cleared
    pub fn auto_resolve(&mut self, now: DateTime<Utc>) {
        self.status = AlertStatus::Resolved;
        self.auto_resolved = true;
        self.resolved_at = Some(now);
        self.updated_at = now;
    }
}

/// Alert draft produced by an evaluation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAlert {
    /// Rule that triggered
    pub rule_id: Option<Uuid>,

    /// Short summary
    pub title: String,

    /// Human-readable message
    pub message: String,

    /// Severity level
    pub severity: Severity,

    /// Diagnostic payload
    pub context: AlertContext,
}

impl NewAlert {
    /// Turn the draft into a pending alert created at `now`
    pub fn into_alert(self, id: AlertId, now: DateTime<Utc>) -> Alert {
        Alert {
            id,
            rule_id: self.rule_id,
            title: self.title,
            message: self.message,
            severity: self.severity,
            context: self.context,
            status: AlertStatus::Pending,
            acknowledged_at: None,
            acknowledged_by: None,
            resolved_at: None,
            auto_resolved: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewAlert {
        NewAlert {
            rule_id: Some(Uuid::new_v4()),
            title: "High error rate".to_string(),
            message: "6 errors".to_string(),
            severity: Severity::Critical,
            context: AlertContext {
                error_count: Some(6),
                ..AlertContext::default()
            },
        }
    }

    #[test]
    fn test_into_alert_is_pending() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let alert = draft().into_alert(id, now);

        assert_eq!(alert.id, id);
        assert!(alert.is_pending());
        assert!(!alert.auto_resolved);
        assert_eq!(alert.created_at, now);
        assert_eq!(alert.context.error_count, Some(6));
    }

    #[test]
    fn test_auto_resolve() {
        let created = Utc::now();
        let mut alert = draft().into_alert(Uuid::new_v4(), created);
        let later = created + chrono::Duration::minutes(10);

        alert.auto_resolve(later);

        assert_eq!(alert.status, AlertStatus::Resolved);
        assert!(alert.auto_resolved);
        assert_eq!(alert.resolved_at, Some(later));
        assert_eq!(alert.updated_at, later);
        assert_eq!(alert.created_at, created);
    }

    #[test]
    fn test_severity_display_matches_serde() {
        for severity in [Severity::Info, Severity::Warning, Severity::Critical] {
            let json = serde_json::to_string(&severity).unwrap();
            assert_eq!(json, format!("\"{severity}\""));
        }
    }

    #[test]
    fn test_context_omits_unset_fields() {
        let json = serde_json::to_value(AlertContext::default()).unwrap();
        assert!(json.get("error_count").is_none());
        assert!(json.get("pattern").is_none());
        assert_eq!(json["function_names"], serde_json::json!([]));
    }
}
