//! Migration service - applies pending up scripts
//!
//! Every script applied by one `run` is logged with the same step, so a
//! later rollback can revert them as one batch.

use serde::Serialize;

use super::catalog::{MigrationCatalog, UpScript};
use crate::domain::result::{Error, Result};
use crate::domain::MigrationRecord;
use crate::ports::{MigrationLog, ScriptSource, SqlExecutor};

/// Result of running migrations
#[derive(Debug, Clone, Serialize)]
pub struct MigrationResult {
    /// Step the new migrations were logged under
    pub step: u32,
    /// Names of newly applied migrations, in application order
    pub applied: Vec<String>,
    /// Count of candidate scripts that were already applied
    pub already_applied: usize,
}

/// Service for applying migrations
pub struct MigrationService<'a> {
    source: &'a dyn ScriptSource,
    executor: &'a dyn SqlExecutor,
}

impl<'a> MigrationService<'a> {
    pub fn new(source: &'a dyn ScriptSource, executor: &'a dyn SqlExecutor) -> Self {
        Self { source, executor }
    }

    /// Run all pending migrations
    ///
    /// 1. Lists up scripts in file name order
    /// 2. Fixes the step for this run at `last_step + 1`
    /// 3. Executes each script not yet in the log and logs it on success
    ///
    /// Stops at the first failing script with [`Error::Query`]. Scripts
    /// applied before it stay applied and logged. Returns
    /// [`Error::NoMigrations`] when nothing needed to run.
    ///
    /// A pending migration whose name the log can't store fails the run
    /// with [`Error::MalformedRecord`] before any script is executed.
    pub fn run(&self, log: &mut dyn MigrationLog) -> Result<MigrationResult> {
        let catalog = MigrationCatalog::new(self.source);
        let scripts = catalog.up_scripts(log)?;
        let step = log.last_step().checked_add(1).ok_or_else(|| {
            Error::malformed(format!("log is at step {}, no next step", log.last_step()))
        })?;

        for script in scripts.iter().filter(|s| !log.contains(&s.name)) {
            MigrationRecord::new(script.name.clone(), step).validate()?;
        }

        let mut applied = Vec::new();
        let mut already_applied = 0;

        for UpScript { file_name, name } in scripts {
            if log.contains(&name) {
                tracing::debug!(migration = %name, "Already applied, skipping");
                already_applied += 1;
                continue;
            }

            let sql = catalog.read(&file_name)?;

            tracing::debug!(script = %file_name, step, "Applying migration");
            self.executor
                .execute(&sql)
                .map_err(|e| Error::query(&file_name, e))?;

            log.add(MigrationRecord::new(name.clone(), step))?;
            applied.push(name);
        }

        if applied.is_empty() {
            return Err(Error::NoMigrations);
        }

        tracing::info!(step, count = applied.len(), "Applied migrations");

        Ok(MigrationResult {
            step,
            applied,
            already_applied,
        })
    }

    /// Names of the migrations the next `run` would apply, in order
    pub fn pending(&self, log: &dyn MigrationLog) -> Result<Vec<String>> {
        let pending = MigrationCatalog::new(self.source).pending(log)?;
        Ok(pending.into_iter().map(|s| s.name).collect())
    }
}
