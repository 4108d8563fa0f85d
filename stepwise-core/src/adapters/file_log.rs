//! File-backed migration log
//!
//! One record per line, `{step},{name}`, appended in application order.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::result::{Error, Result};
use crate::domain::MigrationRecord;
use crate::ports::MigrationLog;

/// Migration log stored in a plain text file
#[derive(Debug)]
pub struct FileLog {
    path: PathBuf,
    records: Vec<MigrationRecord>,
}

impl FileLog {
    /// Create an uninitialized log; call [`MigrationLog::init`] before use
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }

    /// Create the log file if needed and load its records
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut log = Self::new(path);
        log.init()?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<MigrationRecord>> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::storage(format!("Cannot read log file {}: {}", self.path.display(), e))
        })?;

        content.lines().map(MigrationRecord::from_line).collect()
    }

    fn create_store(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                Error::storage(format!("Cannot create log directory {}: {}", dir.display(), e))
            })?;
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                Error::storage(format!("Cannot create log file {}: {}", self.path.display(), e))
            })?;

        Ok(())
    }
}

impl MigrationLog for FileLog {
    fn init(&mut self) -> Result<()> {
        self.create_store()?;
        self.records = self.load()?;

        tracing::debug!(
            path = %self.path.display(),
            records = self.records.len(),
            "Loaded file migration log"
        );

        Ok(())
    }

    fn add(&mut self, record: MigrationRecord) -> Result<()> {
        record.validate()?;

        // No `create`: a log file removed behind our back is an error, not a fresh log
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::storage(format!("Cannot open log file: {}", e)))?;

        writeln!(file, "{}", record.to_line())
            .map_err(|e| Error::storage(format!("Cannot write to log file: {}", e)))?;

        self.records.push(record);
        Ok(())
    }

    fn pop(&mut self) -> Result<MigrationRecord> {
        let Some((last, remaining)) = self.records.split_last() else {
            return Err(Error::EmptyLog);
        };

        let mut content = String::new();
        for record in remaining {
            content.push_str(&record.to_line());
            content.push('\n');
        }

        // Truncate then rewrite: not crash-atomic, a crash in between loses
        // the remaining records on disk.
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| Error::storage(format!("Cannot open log file: {}", e)))?;

        file.write_all(content.as_bytes())
            .map_err(|e| Error::storage(format!("Cannot rewrite log file: {}", e)))?;

        let last = last.clone();
        self.records.pop();
        Ok(last)
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

    fn storage_file(&self) -> Option<&Path> {
        Some(&self.path)
    }
}
