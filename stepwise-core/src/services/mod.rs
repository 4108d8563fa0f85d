//! Service layer - migration use cases
//!
//! Services coordinate the naming convention and the ports. Each service
//! focuses on one command.

pub mod catalog;
mod create;
mod migration;
mod rollback;
mod status;

pub use catalog::{MigrationCatalog, UpScript};
pub use create::{CreateService, CreatedMigration};
pub use migration::{MigrationResult, MigrationService};
pub use rollback::{RollbackResult, RollbackService};
pub use status::{StatusService, StatusSummary};
