//! Result and error types for the core library

use thiserror::Error;

/// Error raised by the SQL execution boundary
///
/// Carries the driver's message only; the script it belongs to is attached
/// by the caller when it is wrapped into [`Error::Query`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DriverError {
    message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<duckdb::Error> for DriverError {
    fn from(e: duckdb::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// Backing store of the log could not be created, read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// A log line or row could not be parsed into a migration record
    #[error("Malformed log record: {0}")]
    MalformedRecord(String),

    /// A migration or rollback script failed to execute
    #[error("error executing query in {script}: {source}")]
    Query {
        script: String,
        #[source]
        source: DriverError,
    },

    /// A script could not be listed or read from the migration source
    #[error("Unable to read migration '{script}': {source}")]
    Source {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// Every candidate migration has already been applied
    #[error("No new migrations to run")]
    NoMigrations,

    /// The log is empty, there is no batch to revert
    #[error("No migrations to roll back")]
    NothingToRollBack,

    /// `pop` was called on an empty log
    #[error("Cannot pop from an empty migration log")]
    EmptyLog,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a malformed record error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap a driver failure with the name of the script that caused it
    pub fn query(script: impl Into<String>, source: DriverError) -> Self {
        Self::Query {
            script: script.into(),
            source,
        }
    }

    /// True for the "nothing to do" outcomes, which are not failures
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoMigrations | Self::NothingToRollBack)
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_names_script_and_driver_error() {
        let err = Error::query("1_users_up.sql", DriverError::new("syntax error at \"I\""));
        let msg = err.to_string();
        assert!(msg.contains("1_users_up.sql"));
        assert!(msg.contains("syntax error"));
    }

    #[test]
    fn test_noop_variants() {
        assert!(Error::NoMigrations.is_noop());
        assert!(Error::NothingToRollBack.is_noop());
        assert!(!Error::EmptyLog.is_noop());
        assert!(!Error::storage("disk full").is_noop());
    }
}
