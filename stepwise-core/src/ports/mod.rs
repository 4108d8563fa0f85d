//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The migration
//! services depend only on these traits, not on concrete implementations.

mod executor;
mod log;
mod source;

pub use executor::SqlExecutor;
pub use log::MigrationLog;
pub use source::ScriptSource;
