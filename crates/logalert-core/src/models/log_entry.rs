//! Log entry data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity level of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Failure
    Error,
    /// Warning
    Warn,
    /// Informational
    #[default]
    Info,
    /// Debug output
    Debug,
}

impl LogLevel {
    /// Map a free-form level string onto a known level.
    ///
    /// `error`/`err` become [`LogLevel::Error`], `warn` and `debug` map to
    /// themselves, anything else is treated as [`LogLevel::Info`].
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "error" | "err" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
        }
    }
}

/// A normalized log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the line was emitted
    pub timestamp: DateTime<Utc>,

    /// Normalized level
    pub level: LogLevel,

    /// Log message
    pub message: String,

    /// Logical source (function) that emitted the line
    pub function_name: String,

    /// Request correlation id, if the source recorded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Additional free-form fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl LogEntry {
    /// Build an entry without request id or metadata
    pub fn new(
        timestamp: DateTime<Utc>,
        level: LogLevel,
        function_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            level,
            message: message.into(),
            function_name: function_name.into(),
            request_id: None,
            metadata: None,
        }
    }

    /// Whether this entry is at error level
    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }
}
