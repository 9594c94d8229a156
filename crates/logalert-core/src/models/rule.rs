//! Alert rule data models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::alert::Severity;

/// Discriminant of an alert rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Error count over a time window
    ErrorRate,
    /// Regex match against error messages
    ErrorPattern,
    /// Consecutive failures per function
    FunctionHealth,
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ErrorRate => write!(f, "error_rate"),
            Self::ErrorPattern => write!(f, "error_pattern"),
            Self::FunctionHealth => write!(f, "function_health"),
        }
    }
}

/// Settings for an `error_rate` rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRateConfig {
    /// Minimum number of errors that triggers the rule
    pub threshold: u32,
    /// Look-back window in minutes
    pub window_minutes: u32,
    /// Optional case-insensitive filter on error messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_pattern: Option<String>,
}

/// Settings for an `error_pattern` rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPatternConfig {
    /// Regex matched against error messages
    pub pattern: String,
    /// Match case-sensitively
    #[serde(default)]
    pub case_sensitive: bool,
}

/// Settings for a `function_health` rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionHealthConfig {
    /// Length of the most-recent error streak that triggers the rule
    pub consecutive_failures: u32,
}

/// Type-specific rule configuration.
///
/// Serialized as `{"rule_type": "...", "config": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule_type", content = "config", rename_all = "snake_case")]
pub enum RuleConfig {
    /// Error count over a time window
    ErrorRate(ErrorRateConfig),
    /// Regex match against error messages
    ErrorPattern(ErrorPatternConfig),
    /// Consecutive failures per function
    FunctionHealth(FunctionHealthConfig),
}

impl RuleConfig {
    /// The discriminant of this configuration
    pub fn rule_type(&self) -> RuleType {
        match self {
            Self::ErrorRate(_) => RuleType::ErrorRate,
            Self::ErrorPattern(_) => RuleType::ErrorPattern,
            Self::FunctionHealth(_) => RuleType::FunctionHealth,
        }
    }
}

/// A configured monitoring rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    /// Unique identifier
    pub id: Uuid,

    /// Human-readable name
    pub name: String,

    /// Description of what this rule monitors
    #[serde(default)]
    pub description: Option<String>,

    /// Rule type and its settings
    #[serde(flatten)]
    pub config: RuleConfig,

    /// Functions this rule is restricted to (None = all functions)
    #[serde(default)]
    pub target_functions: Option<Vec<String>>,

    /// Severity of alerts created by this rule
    #[serde(default)]
    pub severity: Severity,

    /// Minimum minutes between two alerts of this rule
    #[serde(default)]
    pub cooldown_minutes: u32,

    /// Whether the rule takes part in evaluation passes
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl AlertRule {
    /// The discriminant of this rule
    pub fn rule_type(&self) -> RuleType {
        self.config.rule_type()
    }

    /// Whether logs from `function_name` are in scope for this rule
    pub fn targets(&self, function_name: &str) -> bool {
        match &self.target_functions {
            Some(targets) => targets.iter().any(|t| t == function_name),
            None => true,
        }
    }
}
