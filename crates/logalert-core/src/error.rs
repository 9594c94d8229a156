//! Error types for LogAlert
//!
//! The decision core never fails; these errors come from the collaborators
//! around it (configuration, log sources, repositories).

use thiserror::Error;

/// Result alias used by the I/O-facing parts of the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the collaborators around the engine
#[derive(Error, Debug)]
pub enum Error {
    /// Settings that the runner cannot work with
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration source could not be read or deserialized
    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// A referenced rule or alert does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up
        entity: String,
        /// Identifier that was not found
        id: String,
    },

    /// Persistence layer rejected a batch
    #[error("Storage error: {0}")]
    Storage(String),

    /// A log or data file could not be read or written
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Missing entity
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Invalid setting
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Rejected write
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
