//! Ingest module - turns raw log lines into normalized entries
//!
//! The parser accepts structured records and a couple of text layouts; the
//! sources bound the result to the recent window the engine evaluates.

pub mod parser;
mod source;

pub use parser::{parse_line, parse_logs, parse_timestamp, UNKNOWN_FUNCTION};
pub use source::{bound_logs, FileLogSource, LogSource, StaticLogSource};
