//! In-memory adapters
//!
//! Stand-ins for the filesystem, the log store and the database. Used by
//! tests, and by embedders that ship their scripts inside the binary:
//!
//! ```
//! use stepwise_core::adapters::memory::MemorySource;
//!
//! const SCRIPTS: &[(&str, &str)] = &[
//!     ("001_users_up.sql", "CREATE TABLE users (name VARCHAR)"),
//!     ("001_users_down.sql", "DROP TABLE users"),
//! ];
//!
//! let source = MemorySource::from_pairs(SCRIPTS);
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;

use crate::domain::result::{DriverError, Error, Result};
use crate::domain::MigrationRecord;
use crate::ports::{MigrationLog, ScriptSource, SqlExecutor};

/// Script files held in a map
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(file name, contents)` pairs
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut source = Self::new();
        for (name, sql) in pairs {
            source.insert(*name, *sql);
        }
        source
    }

    pub fn with_script(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.insert(name, sql);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, sql: impl Into<String>) {
        self.files.insert(name.into(), sql.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.files.remove(name)
    }
}

impl ScriptSource for MemorySource {
    fn list(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn read(&self, name: &str) -> Result<String> {
        self.files.get(name).cloned().ok_or_else(|| Error::Source {
            script: name.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such script"),
        })
    }

    fn exists(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }
}

/// Log kept only in memory
///
/// `set_read_only(true)` makes every write fail with a storage error, to
/// exercise the failure paths of callers.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    records: Vec<MigrationRecord>,
    read_only: bool,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::storage("memory log is read-only"));
        }
        Ok(())
    }
}

impl MigrationLog for MemoryLog {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn add(&mut self, record: MigrationRecord) -> Result<()> {
        record.validate()?;
        self.check_writable()?;
        self.records.push(record);
        Ok(())
    }

    fn pop(&mut self) -> Result<MigrationRecord> {
        if self.records.is_empty() {
            return Err(Error::EmptyLog);
        }
        self.check_writable()?;
        self.records.pop().ok_or(Error::EmptyLog)
    }

    fn contains(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name == name)
    }

    fn last_step(&self) -> u32 {
        self.records.last().map(|r| r.step).unwrap_or(0)
    }

    fn records(&self) -> &[MigrationRecord] {
        &self.records
    }
}

/// Executor that records scripts instead of running them
///
/// Scripts containing the configured marker fail with a driver error.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    executed: RefCell<Vec<String>>,
    fail_marker: Option<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every script whose text contains `marker`
    pub fn failing_on(marker: impl Into<String>) -> Self {
        Self {
            executed: RefCell::new(Vec::new()),
            fail_marker: Some(marker.into()),
        }
    }

    /// Text of every successfully executed script, in order
    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }
}

impl SqlExecutor for RecordingExecutor {
    fn execute(&self, sql: &str) -> std::result::Result<(), DriverError> {
        if let Some(marker) = &self.fail_marker {
            if sql.contains(marker.as_str()) {
                return Err(DriverError::new(format!("rejected script containing {:?}", marker)));
            }
        }
        self.executed.borrow_mut().push(sql.to_string());
        Ok(())
    }
}
