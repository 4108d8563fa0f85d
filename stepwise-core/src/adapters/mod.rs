//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Plain text file for the MigrationLog port
//! - DuckDB table for the MigrationLog port
//! - DuckDB connection for the SqlExecutor port
//! - Local directory for the ScriptSource port
//! - In-memory fakes for all three

pub mod directory;
pub mod duckdb;
pub mod file_log;
pub mod memory;
pub mod table_log;

pub use self::directory::DirectorySource;
pub use self::duckdb::Database;
pub use self::file_log::FileLog;
pub use self::table_log::{DuckDbLog, DEFAULT_LOG_TABLE};
