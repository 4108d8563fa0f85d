//! Migration log port - applied migration bookkeeping

use std::path::Path;

use crate::domain::result::Result;
use crate::domain::MigrationRecord;

/// Ordered record of applied migrations
///
/// Insertion order is application order. Records are only ever appended to
/// or popped from the tail. Every backend keeps an in-memory copy of the
/// records that must agree with the backing store after each successful
/// `add`/`pop`; a failed `add`/`pop` leaves that copy untouched.
///
/// A log assumes a single writer per backing store. Concurrent processes
/// sharing a file or table must be serialized by the caller.
pub trait MigrationLog {
    // === Lifecycle ===

    /// Create the backing store if missing and load existing records
    fn init(&mut self) -> Result<()>;

    // === Mutation ===

    /// Durably append a record, then cache it
    fn add(&mut self, record: MigrationRecord) -> Result<()>;

    /// Remove and return the most recently added record
    ///
    /// Fails with [`Error::EmptyLog`](crate::Error::EmptyLog) when there is
    /// nothing to pop.
    fn pop(&mut self) -> Result<MigrationRecord>;

    // === Queries ===

    /// True iff a record's name equals `name` exactly
    fn contains(&self, name: &str) -> bool;

    /// Step of the most recent record, `0` when the log is empty
    fn last_step(&self) -> u32;

    /// All records in application order
    fn records(&self) -> &[MigrationRecord];

    /// File the log is persisted in, if it lives on the filesystem
    ///
    /// Used to keep the log out of the script listing when it shares a
    /// directory with the scripts.
    fn storage_file(&self) -> Option<&Path> {
        None
    }
}
