//! Core domain entities
//!
//! Pure data structures and the script naming convention - no I/O.

mod record;
pub mod result;
pub mod script;

pub use record::MigrationRecord;
pub use script::{ScriptKind, ScriptName};
