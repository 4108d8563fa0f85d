//! Rollback service - reverts the most recent batch
//!
//! One `run` undoes exactly the migrations of one earlier migration run:
//! every record sharing the log's last step, newest first.

use serde::Serialize;

use super::catalog::MigrationCatalog;
use crate::domain::result::{Error, Result};
use crate::ports::{MigrationLog, ScriptSource, SqlExecutor};

/// Result of a rollback
#[derive(Debug, Clone, Serialize)]
pub struct RollbackResult {
    /// Step that was reverted
    pub step: u32,
    /// Migrations removed from the log, in the order they were reverted
    pub reverted: Vec<String>,
    /// Subset of `reverted` that had no down script
    pub irreversible: Vec<String>,
}

/// Service for reverting migrations
pub struct RollbackService<'a> {
    source: &'a dyn ScriptSource,
    executor: &'a dyn SqlExecutor,
}

impl<'a> RollbackService<'a> {
    pub fn new(source: &'a dyn ScriptSource, executor: &'a dyn SqlExecutor) -> Self {
        Self { source, executor }
    }

    /// Revert every migration logged under the last step
    ///
    /// A migration without a down script is dropped from the log without
    /// executing anything. The record is popped before its down script
    /// runs: if the script fails with [`Error::Query`], the migration is
    /// already gone from the log even though the database still has it.
    pub fn run(&self, log: &mut dyn MigrationLog) -> Result<RollbackResult> {
        let step = log.last_step();
        if step == 0 {
            return Err(Error::NothingToRollBack);
        }

        let catalog = MigrationCatalog::new(self.source);
        let mut reverted = Vec::new();
        let mut irreversible = Vec::new();

        while log.last_step() == step {
            let record = log.pop()?;

            match catalog.down_script(&record.name) {
                None => {
                    tracing::debug!(migration = %record.name, "No down script, dropping from log");
                    irreversible.push(record.name.clone());
                }
                Some(file_name) => {
                    let sql = catalog.read(&file_name)?;
                    tracing::debug!(script = %file_name, step, "Reverting migration");
                    self.executor
                        .execute(&sql)
                        .map_err(|e| Error::query(&file_name, e))?;
                }
            }

            reverted.push(record.name);
        }

        tracing::info!(step, count = reverted.len(), "Rolled back migrations");

        Ok(RollbackResult {
            step,
            reverted,
            irreversible,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryLog, MemorySource, RecordingExecutor};
    use crate::domain::MigrationRecord;

    fn log_with(records: &[(&str, u32)]) -> MemoryLog {
        let mut log = MemoryLog::new();
        for (name, step) in records {
            log.add(MigrationRecord::new(*name, *step)).unwrap();
        }
        log
    }

    #[test]
    fn test_empty_log_is_noop() {
        let source = MemorySource::new();
        let executor = RecordingExecutor::new();
        let mut log = MemoryLog::new();

        let err = RollbackService::new(&source, &executor).run(&mut log).unwrap_err();
        assert!(matches!(err, Error::NothingToRollBack));
    }

    #[test]
    fn test_reverts_last_step_in_reverse_order() {
        let source = MemorySource::new()
            .with_script("1_a_down.sql", "UNDO a")
            .with_script("2_b_down.sql", "UNDO b")
            .with_script("3_c_down.sql", "UNDO c");
        let executor = RecordingExecutor::new();
        let mut log = log_with(&[("1_a", 1), ("2_b", 2), ("3_c", 2)]);

        let result = RollbackService::new(&source, &executor).run(&mut log).unwrap();

        assert_eq!(result.step, 2);
        assert_eq!(result.reverted, vec!["3_c", "2_b"]);
        assert_eq!(executor.executed(), vec!["UNDO c", "UNDO b"]);
        assert_eq!(log.records(), &[MigrationRecord::new("1_a", 1)]);
    }

    #[test]
    fn test_missing_down_script_still_pops() {
        let source = MemorySource::new().with_script("1_a_down.sql", "UNDO a");
        let executor = RecordingExecutor::new();
        let mut log = log_with(&[("1_a", 1), ("2_x", 1)]);

        let result = RollbackService::new(&source, &executor).run(&mut log).unwrap();

        assert_eq!(result.reverted, vec!["2_x", "1_a"]);
        assert_eq!(result.irreversible, vec!["2_x"]);
        assert_eq!(executor.executed(), vec!["UNDO a"]);
        assert!(log.records().is_empty());
    }

    #[test]
    fn test_failed_down_script_leaves_record_popped() {
        let source = MemorySource::new()
            .with_script("1_a_down.sql", "UNDO a")
            .with_script("2_b_down.sql", "BROKEN");
        let executor = RecordingExecutor::failing_on("BROKEN");
        let mut log = log_with(&[("1_a", 1), ("2_b", 1)]);

        let err = RollbackService::new(&source, &executor).run(&mut log).unwrap_err();

        match err {
            Error::Query { script, .. } => assert_eq!(script, "2_b_down.sql"),
            other => panic!("expected query error, got {:?}", other),
        }
        assert_eq!(log.records(), &[MigrationRecord::new("1_a", 1)]);
        assert!(executor.executed().is_empty());
    }

    #[test]
    fn test_pop_failure_is_reported() {
        let source = MemorySource::new();
        let executor = RecordingExecutor::new();
        let mut log = log_with(&[("1_a", 1)]);
        log.set_read_only(true);

        let err = RollbackService::new(&source, &executor).run(&mut log).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(log.records().len(), 1);
    }
}
