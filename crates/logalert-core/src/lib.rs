//! # LogAlert
//!
//! Log-driven alert rule evaluation.
//!
//! LogAlert takes a catalog of monitoring rules and a window of recent log
//! entries, decides which rules are triggered, holds back alerts that are in
//! cooldown, and picks pending alerts whose condition has cleared.
//!
//! ## Architecture
//!
//! - **Ingest**: parses raw log lines into normalized entries
//! - **Alerting**: safe regex construction, rule evaluators, cooldown,
//!   auto-resolution and batch orchestration
//! - **Runner**: one pass of fetch, evaluate, persist, with a run summary
//!
//! ## Quick Start
//!
//! ```bash
//! # Evaluate rules against a log file
//! logalert evaluate --rules rules.json --logs app.log
//!
//! # Check whether a pattern would be accepted
//! logalert check-pattern "timeout|refused"
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod alerting;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;

pub use crate::config::Config;
pub use crate::error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::alerting::{
        evaluate_all_rules, evaluate_batch, evaluate_rule, find_alerts_to_auto_resolve,
        is_in_cooldown, safe_create_regex, AlertRepository, AlertRunner, EvaluationBatches,
        InMemoryAlertRepository,
    };
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::ingest::{parse_line, parse_logs, FileLogSource, LogSource};
    pub use crate::models::*;
}
