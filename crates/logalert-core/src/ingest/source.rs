//! Log sources feeding an evaluation pass

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::models::LogEntry;

use super::parser::parse_logs;

/// Supplies the recent log window for an evaluation pass
#[async_trait::async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch entries at or after `since`, newest first, at most `limit` of them.
    ///
    /// `now` is the evaluation time of the pass.
    async fn fetch_logs(
        &self,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<LogEntry>>;
}

/// Keep entries at or after `since`, newest first, capped to `limit`
pub fn bound_logs(mut entries: Vec<LogEntry>, since: DateTime<Utc>, limit: usize) -> Vec<LogEntry> {
    entries.retain(|entry| entry.timestamp >= since);
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries.truncate(limit);
    entries
}

/// Reads raw log lines from a file
#[derive(Debug, Clone)]
pub struct FileLogSource {
    path: PathBuf,
}

impl FileLogSource {
    /// Create a source reading from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl LogSource for FileLogSource {
    async fn fetch_logs(
        &self,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<LogEntry>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let total_lines = content.lines().count();
        let parsed = parse_logs(content.lines(), now);
        let parsed_count = parsed.len();
        let entries = bound_logs(parsed, since, limit);

        debug!(
            path = %self.path.display(),
            lines = total_lines,
            parsed = parsed_count,
            kept = entries.len(),
            "Read log file"
        );

        Ok(entries)
    }
}

/// Serves a fixed set of already-parsed entries
#[derive(Debug, Clone, Default)]
pub struct StaticLogSource {
    entries: Vec<LogEntry>,
}

impl StaticLogSource {
    /// Create a source over `entries`
    pub fn new(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait::async_trait]
impl LogSource for StaticLogSource {
    async fn fetch_logs(
        &self,
        since: DateTime<Utc>,
        _now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<LogEntry>> {
        Ok(bound_logs(self.entries.clone(), since, limit))
    }
}
