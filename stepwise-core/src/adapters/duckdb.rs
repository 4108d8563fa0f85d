//! DuckDB database handle - the SQL execution boundary

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use duckdb::Connection;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;

use crate::domain::result::{DriverError, Error, Result};
use crate::ports::SqlExecutor;

/// Parse a script and count its statements.
/// The parser lags behind DuckDB's grammar, so a parse failure only means
/// "not known to be valid"; the engine has the final say.
fn count_statements(sql: &str) -> std::result::Result<usize, DriverError> {
    let dialect = DuckDbDialect {};
    Parser::parse_sql(&dialect, sql)
        .map(|statements| statements.len())
        .map_err(|e| {
            let msg = e.to_string();
            DriverError::new(msg.trim_start_matches("sql parser error: "))
        })
}

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB connection that migration scripts run against
///
/// Implements [`SqlExecutor`] and is shared (behind an `Arc`) with
/// [`DuckDbLog`](super::table_log::DuckDbLog) when the log lives in the
/// same database.
pub struct Database {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
    validate_sql: bool,
}

impl Database {
    /// Open (or create) a database file
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which show up when another process is holding the file.
    pub fn open(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self::from_connection(conn, Some(db_path.to_path_buf())));
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        tracing::warn!(
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            "Database busy, retrying in {}ms: {}",
                            delay.as_millis(),
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(Error::storage(format!(
                        "Cannot open database {}: {}",
                        db_path.display(),
                        err_msg
                    )));
                }
            }
        }

        Err(Error::storage(match last_error {
            Some(e) => format!("Failed to open database after {} retries: {}", MAX_RETRIES, e),
            None => format!("Failed to open database after {} retries", MAX_RETRIES),
        }))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self::from_connection(conn, None))
    }

    /// Attempt to open a database connection (called by open() with retry logic)
    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Autoloaded extensions come from a user cache we don't control
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    fn from_connection(conn: Connection, db_path: Option<PathBuf>) -> Self {
        Self {
            conn: Mutex::new(conn),
            db_path,
            validate_sql: false,
        }
    }

    /// Reject scripts the SQL parser can't read before they reach DuckDB
    /// (off by default)
    ///
    /// Strict mode also rejects DuckDB-only syntax the parser doesn't know,
    /// such as `PIVOT`.
    pub fn with_sql_validation(mut self, validate_sql: bool) -> Self {
        self.validate_sql = validate_sql;
        self
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run `f` with exclusive access to the connection
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl SqlExecutor for Database {
    fn execute(&self, sql: &str) -> std::result::Result<(), DriverError> {
        let has_statements = match count_statements(sql) {
            Ok(count) => count > 0,
            Err(e) if self.validate_sql => return Err(e),
            Err(e) => {
                tracing::debug!("SQL parser can't read script, passing it to DuckDB: {}", e);
                true
            }
        };

        if !has_statements {
            tracing::debug!("Script has no statements, nothing to execute");
            return Ok(());
        }

        let conn = self
            .conn
            .lock()
            .map_err(|e| DriverError::new(format!("Lock poisoned: {}", e)))?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}
