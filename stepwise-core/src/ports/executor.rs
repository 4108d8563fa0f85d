//! SQL execution port

use crate::domain::result::DriverError;

/// Executes raw script text against a configured connection
///
/// Scripts are passed through whole; splitting multi-statement text is left
/// to the implementation.
pub trait SqlExecutor {
    fn execute(&self, sql: &str) -> Result<(), DriverError>;
}
