//! Data models for LogAlert

mod alert;
mod log_entry;
mod rule;
mod run;

pub use alert::*;
pub use log_entry::*;
pub use rule::*;
pub use run::*;
