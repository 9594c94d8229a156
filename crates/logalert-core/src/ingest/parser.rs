//! Raw log line parsing
//!
//! Accepts JSON records, `[ts] [level] [source] message` lines and loose
//! `ts level message` lines. Anything unrecognized is dropped unless it
//! mentions an error, in which case it is kept as an error from an unknown
//! source so that it still counts towards error rules.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::{LogEntry, LogLevel};

/// Function name used when a line does not say where it came from
pub const UNKNOWN_FUNCTION: &str = "unknown";

static BRACKETED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[([^\]]+)\]\s*\[([^\]]+)\]\s*\[([^\]]+)\]\s*(.*)$")
        .expect("bracketed log regex is valid")
});

static LOOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?)\s+([A-Za-z]+):?\s*(.*)$",
    )
    .expect("loose log regex is valid")
});

/// Parse a single raw line. Returns `None` for lines that should be dropped.
///
/// `now` stamps fallback entries whose own timestamp could not be read.
pub fn parse_line(raw: &str, now: DateTime<Utc>) -> Option<LogEntry> {
    let line = raw.trim();
    if line.is_empty() {
        return None;
    }

    parse_structured(line)
        .or_else(|| parse_bracketed(line))
        .or_else(|| parse_loose(line))
        .or_else(|| fallback_error(line, now))
}

/// Parse every line, dropping the ones that are not recognized
pub fn parse_logs<I, S>(lines: I, now: DateTime<Utc>) -> Vec<LogEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| parse_line(line.as_ref(), now))
        .collect()
}

fn parse_structured(line: &str) -> Option<LogEntry> {
    if !line.starts_with('{') {
        return None;
    }

    let Value::Object(record) = serde_json::from_str::<Value>(line).ok()? else {
        return None;
    };

    let timestamp = record.get("timestamp").and_then(timestamp_from_value)?;
    let message = record
        .get("message")
        .or_else(|| record.get("msg"))
        .map(|m| match m {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })?;

    let level = record
        .get("level")
        .and_then(Value::as_str)
        .map_or(LogLevel::Info, LogLevel::normalize);

    let function_name = record
        .get("function_name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_FUNCTION)
        .to_string();

    let request_id = record
        .get("request_id")
        .and_then(Value::as_str)
        .map(str::to_string);

    let metadata = record.get("metadata").filter(|m| !m.is_null()).cloned();

    Some(LogEntry {
        timestamp,
        level,
        message,
        function_name,
        request_id,
        metadata,
    })
}

fn parse_bracketed(line: &str) -> Option<LogEntry> {
    let caps = BRACKETED.captures(line)?;
    let timestamp = parse_timestamp(&caps[1])?;

    Some(LogEntry::new(
        timestamp,
        LogLevel::normalize(&caps[2]),
        caps[3].trim(),
        caps[4].trim(),
    ))
}

fn parse_loose(line: &str) -> Option<LogEntry> {
    let caps = LOOSE.captures(line)?;
    let timestamp = parse_timestamp(&caps[1])?;

    Some(LogEntry::new(
        timestamp,
        LogLevel::normalize(&caps[2]),
        UNKNOWN_FUNCTION,
        caps[3].trim(),
    ))
}

fn fallback_error(line: &str, now: DateTime<Utc>) -> Option<LogEntry> {
    if !line.to_lowercase().contains("error") {
        return None;
    }

    Some(LogEntry::new(now, LogLevel::Error, UNKNOWN_FUNCTION, line))
}

fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_i64().and_then(from_epoch),
        _ => None,
    }
}

/// Parse RFC 3339 or `YYYY-MM-DD HH:MM:SS[.fff][offset]` timestamps.
/// Timestamps without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
    ] {
        if let Ok(ts) = DateTime::parse_from_str(raw, fmt) {
            return Some(ts.with_timezone(&Utc));
        }
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw.parse::<i64>().ok().and_then(from_epoch);
    }

    None
}

/// Interpret an integer epoch as seconds, milliseconds or microseconds
/// depending on its magnitude.
fn from_epoch(value: i64) -> Option<DateTime<Utc>> {
    let magnitude = value.unsigned_abs();
    if magnitude >= 100_000_000_000_000 {
        DateTime::from_timestamp_micros(value)
    } else if magnitude >= 100_000_000_000 {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn ts(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_structured_record() {
        let line = r#"{"timestamp":"2024-06-01T11:55:00Z","level":"ERR","message":"db down","function_name":"checkout","request_id":"req-1","metadata":{"attempt":2}}"#;

        let entry = parse_line(line, now()).unwrap();

        assert_eq!(entry.timestamp, ts(11, 55, 0));
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.message, "db down");
        assert_eq!(entry.function_name, "checkout");
        assert_eq!(entry.request_id.as_deref(), Some("req-1"));
        assert_eq!(entry.metadata, Some(serde_json::json!({"attempt": 2})));
    }

    #[test]
    fn test_structured_record_defaults() {
        let line = r#"{"timestamp":"2024-06-01 11:50:00","msg":"started","level":"notice"}"#;

        let entry = parse_line(line, now()).unwrap();

        assert_eq!(entry.timestamp, ts(11, 50, 0));
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.message, "started");
        assert_eq!(entry.function_name, UNKNOWN_FUNCTION);
        assert!(entry.request_id.is_none());
    }

    #[test]
    fn test_structured_epoch_micros() {
        let micros = ts(11, 0, 0).timestamp_micros();
        let line = format!(r#"{{"timestamp":{micros},"message":"tick","level":"debug"}}"#);

        let entry = parse_line(&line, now()).unwrap();

        assert_eq!(entry.timestamp, ts(11, 0, 0));
        assert_eq!(entry.level, LogLevel::Debug);
    }

    #[test]
    fn test_structured_without_message_falls_back() {
        // No message field: not a structured entry, but it mentions an error.
        let line = r#"{"timestamp":"2024-06-01T11:55:00Z","error":"boom"}"#;

        let entry = parse_line(line, now()).unwrap();

        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.timestamp, now());
        assert_eq!(entry.function_name, UNKNOWN_FUNCTION);
    }

    #[test]
    fn test_bracketed_line() {
        let line = "[2024-06-01T11:58:30.250Z] [WARN] [send-email] retrying delivery";

        let entry = parse_line(line, now()).unwrap();

        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.function_name, "send-email");
        assert_eq!(entry.message, "retrying delivery");
        assert_eq!(entry.timestamp.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_loose_line() {
        let line = "2024-06-01 11:59:00 error: connection refused";

        let entry = parse_line(line, now()).unwrap();

        assert_eq!(entry.timestamp, ts(11, 59, 0));
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.message, "connection refused");
        assert_eq!(entry.function_name, UNKNOWN_FUNCTION);
    }

    #[test]
    fn test_free_text_error_fallback() {
        let entry = parse_line("Unhandled ERROR in worker", now()).unwrap();

        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.timestamp, now());
        assert_eq!(entry.message, "Unhandled ERROR in worker");
    }

    #[test]
    fn test_unrecognized_lines_are_dropped() {
        assert!(parse_line("", now()).is_none());
        assert!(parse_line("   ", now()).is_none());
        assert!(parse_line("booting up", now()).is_none());
        assert!(parse_line("[not a date] [info] [x] hello", now()).is_none());
    }

    #[test]
    fn test_parse_logs_filters_drops() {
        let lines = [
            "[2024-06-01T11:58:00Z] [error] [api] timeout",
            "nothing to see",
            r#"{"timestamp":"2024-06-01T11:57:00Z","message":"ok","level":"info","function_name":"api"}"#,
        ];

        let entries = parse_logs(lines, now());

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "timeout");
        assert_eq!(entries[1].message, "ok");
    }

    #[test]
    fn test_parse_timestamp_offsets() {
        assert_eq!(
            parse_timestamp("2024-06-01 13:00:00+01:00"),
            Some(ts(12, 0, 0))
        );
        assert_eq!(
            parse_timestamp("2024-06-01T12:00:00+0100"),
            Some(ts(11, 0, 0))
        );
        assert_eq!(
            parse_timestamp(&ts(10, 0, 0).timestamp().to_string()),
            Some(ts(10, 0, 0))
        );
        assert!(parse_timestamp("yesterday").is_none());
    }
}
