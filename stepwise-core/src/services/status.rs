//! Status service - applied and pending migrations

use serde::Serialize;

use super::catalog::MigrationCatalog;
use crate::domain::result::Result;
use crate::domain::MigrationRecord;
use crate::ports::{MigrationLog, ScriptSource};

/// Status service for migration summaries
pub struct StatusService<'a> {
    source: &'a dyn ScriptSource,
}

impl<'a> StatusService<'a> {
    pub fn new(source: &'a dyn ScriptSource) -> Self {
        Self { source }
    }

    /// Get overall status summary
    pub fn get_status(&self, log: &dyn MigrationLog) -> Result<StatusSummary> {
        let pending = MigrationCatalog::new(self.source).pending(log)?;

        Ok(StatusSummary {
            last_step: log.last_step(),
            applied: log.records().to_vec(),
            pending: pending.into_iter().map(|s| s.name).collect(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub last_step: u32,
    /// Applied migrations in application order
    pub applied: Vec<MigrationRecord>,
    /// Migrations the next run would apply, in order
    pub pending: Vec<String>,
}
