//! Stepwise Core - ordered SQL migrations with batch rollback
//!
//! This crate implements the migration engine following hexagonal architecture:
//!
//! - **domain**: Migration records, the script naming convention, errors
//! - **ports**: Trait definitions for external dependencies (MigrationLog, ScriptSource, SqlExecutor)
//! - **services**: Apply, rollback, status and create use cases
//! - **adapters**: Concrete implementations (text file, DuckDB, local directory, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use adapters::{Database, DirectorySource, DuckDbLog, FileLog};
use config::{Config, LogBackend};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{DriverError, Error, Result};
pub use domain::MigrationRecord;
pub use ports::{MigrationLog, ScriptSource, SqlExecutor};

/// Main context for stepwise operations
///
/// Holds the configuration, the database connection, the migration log and
/// the script directory of one project.
pub struct StepwiseContext {
    pub config: Config,
    pub project_dir: PathBuf,
    pub database: Arc<Database>,
    pub log: Box<dyn MigrationLog>,
    pub source: DirectorySource,
}

impl StepwiseContext {
    /// Open the project in `project_dir`
    ///
    /// Opens (or creates) the database and initializes the configured log
    /// backend. The migrations directory itself is not created here.
    pub fn new(project_dir: &Path) -> Result<Self> {
        let config = Config::load(project_dir)?;

        let database = Arc::new(
            Database::open(&config.database_path(project_dir))?
                .with_sql_validation(config.validate_sql),
        );

        let log: Box<dyn MigrationLog> = match config.log_backend {
            LogBackend::File => Box::new(FileLog::open(config.log_file_path(project_dir))?),
            LogBackend::Table => Box::new(DuckDbLog::open(
                Arc::clone(&database),
                config.log_table.clone(),
            )?),
        };

        let source = DirectorySource::new(config.migrations_path(project_dir));

        tracing::debug!(
            project = %project_dir.display(),
            backend = %config.log_backend,
            "Opened stepwise project"
        );

        Ok(Self {
            config,
            project_dir: project_dir.to_path_buf(),
            database,
            log,
            source,
        })
    }

    /// Apply all pending migrations as one step
    pub fn migrate(&mut self) -> Result<MigrationResult> {
        MigrationService::new(&self.source, self.database.as_ref()).run(self.log.as_mut())
    }

    /// Revert the most recent step
    pub fn rollback(&mut self) -> Result<RollbackResult> {
        RollbackService::new(&self.source, self.database.as_ref()).run(self.log.as_mut())
    }

    pub fn status(&self) -> Result<StatusSummary> {
        StatusService::new(&self.source).get_status(self.log.as_ref())
    }

    pub fn create_service(&self) -> CreateService {
        CreateService::new(self.source.root())
    }
}
