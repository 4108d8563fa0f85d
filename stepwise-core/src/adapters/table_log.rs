//! Table-backed migration log (DuckDB)

use std::sync::Arc;

use duckdb::{params, Connection};

use super::duckdb::Database;
use crate::domain::result::{Error, Result};
use crate::domain::MigrationRecord;
use crate::ports::MigrationLog;

/// Default name of the log table
pub const DEFAULT_LOG_TABLE: &str = "migrations";

/// True for a bare SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`)
///
/// The table name is spliced into DDL, so nothing else is accepted.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn record_from_row(name: String, step: i64) -> Result<MigrationRecord> {
    let step = u32::try_from(step)
        .map_err(|_| Error::malformed(format!("row for '{}' has invalid step {}", name, step)))?;
    let record = MigrationRecord::new(name, step);
    record.validate()?;
    Ok(record)
}

/// Migration log stored in a database table
///
/// Rows are ordered by an identity column fed from a sequence (DuckDB has
/// no `AUTOINCREMENT`). The table is read once by `init`; `contains` and
/// `last_step` answer from the cached records, which `add` and `pop` only
/// change after the table write succeeded.
pub struct DuckDbLog {
    db: Arc<Database>,
    table: String,
    records: Vec<MigrationRecord>,
}

impl DuckDbLog {
    /// Create an uninitialized log; call [`MigrationLog::init`] before use
    pub fn new(db: Arc<Database>, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if !is_plain_identifier(&table) {
            return Err(Error::config(format!("Invalid log table name: {:?}", table)));
        }

        Ok(Self {
            db,
            table,
            records: Vec::new(),
        })
    }

    /// Create the log table if needed and load its records
    pub fn open(db: Arc<Database>, table: impl Into<String>) -> Result<Self> {
        let mut log = Self::new(db, table)?;
        log.init()?;
        Ok(log)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn load(conn: &Connection, table: &str) -> Result<Vec<MigrationRecord>> {
        let mut stmt = conn.prepare(&format!("SELECT name, step FROM {} ORDER BY id", table))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (name, step) = row?;
            records.push(record_from_row(name, step)?);
        }
        Ok(records)
    }
}

impl MigrationLog for DuckDbLog {
    fn init(&mut self) -> Result<()> {
        let table = &self.table;
        let records = self.db.with_conn(|conn| {
            conn.execute_batch(&format!(
                "CREATE SEQUENCE IF NOT EXISTS {table}_id_seq START 1;
                 CREATE TABLE IF NOT EXISTS {table} (
                     id INTEGER PRIMARY KEY DEFAULT nextval('{table}_id_seq'),
                     name VARCHAR(100) NOT NULL,
                     step INTEGER NOT NULL
                 );"
            ))
            .map_err(|e| Error::storage(format!("could not create {} table: {}", table, e)))?;

            Self::load(conn, table)
        })?;

        tracing::debug!(table = %self.table, records = records.len(), "Loaded table migration log");
        self.records = records;
        Ok(())
    }

    fn add(&mut self, record: MigrationRecord) -> Result<()> {
        record.validate()?;

        self.db.with_conn(|conn| {
            conn.execute(
                &format!("INSERT INTO {} (name, step) VALUES (?, ?)", self.table),
                params![record.name, i64::from(record.step)],
            )
            .map_err(|e| Error::storage(format!("unable to insert migration: {}", e)))?;
            Ok(())
        })?;

        self.records.push(record);
        Ok(())
    }

    fn pop(&mut self) -> Result<MigrationRecord> {
        if self.records.is_empty() {
            return Err(Error::EmptyLog);
        }

        let record = self.db.with_conn(|conn| {
            let (id, name, step): (i64, String, i64) = conn
                .query_row(
                    &format!(
                        "SELECT id, name, step FROM {} ORDER BY id DESC LIMIT 1",
                        self.table
                    ),
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .map_err(|e| Error::storage(format!("unable to read last migration: {}", e)))?;
            let record = record_from_row(name, step)?;

            let deleted = conn
                .execute(&format!("DELETE FROM {} WHERE id = ?", self.table), [id])
                .map_err(|e| Error::storage(format!("unable to delete migration: {}", e)))?;
            if deleted != 1 {
                return Err(Error::storage(format!(
                    "unable to delete migration '{}': row {} vanished",
                    record.name, id
                )));
            }

            Ok(record)
        })?;

        self.records.pop();
        Ok(record)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::SqlExecutor;

    fn database() -> Arc<Database> {
        Arc::new(Database::open_in_memory().unwrap())
    }

    fn row_count(db: &Database, table: &str) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?)
        })
        .unwrap()
    }

    #[test]
    fn test_plain_identifier() {
        assert!(is_plain_identifier("migrations"));
        assert!(is_plain_identifier("_schema_log2"));
        assert!(!is_plain_identifier(""));
        assert!(!is_plain_identifier("2migrations"));
        assert!(!is_plain_identifier("migrations; DROP TABLE users"));
        assert!(!is_plain_identifier("my-log"));
    }

    #[test]
    fn test_rejects_unsafe_table_name() {
        let err = DuckDbLog::new(database(), "log; DROP TABLE users").err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_init_creates_table_once() {
        let db = database();
        DuckDbLog::open(Arc::clone(&db), DEFAULT_LOG_TABLE).unwrap();
        DuckDbLog::open(Arc::clone(&db), DEFAULT_LOG_TABLE).unwrap();

        assert_eq!(row_count(&db, DEFAULT_LOG_TABLE), 0);
    }

    #[test]
    fn test_init_loads_rows_in_id_order() {
        let db = database();
        {
            let mut log = DuckDbLog::open(Arc::clone(&db), "schema_log").unwrap();
            log.add(MigrationRecord::new("1_users", 1)).unwrap();
            log.add(MigrationRecord::new("2_seed", 1)).unwrap();
            log.add(MigrationRecord::new("3_posts", 2)).unwrap();
        }

        let log = DuckDbLog::open(db, "schema_log").unwrap();
        let names: Vec<_> = log.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["1_users", "2_seed", "3_posts"]);
        assert_eq!(log.last_step(), 2);
    }

    #[test]
    fn test_pop_deletes_row() {
        let db = database();
        let mut log = DuckDbLog::open(Arc::clone(&db), DEFAULT_LOG_TABLE).unwrap();
        log.add(MigrationRecord::new("1_users", 1)).unwrap();
        log.add(MigrationRecord::new("2_seed", 2)).unwrap();

        assert_eq!(log.pop().unwrap(), MigrationRecord::new("2_seed", 2));
        assert_eq!(row_count(&db, DEFAULT_LOG_TABLE), 1);
        assert_eq!(log.last_step(), 1);
    }

    #[test]
    fn test_add_fails_when_table_dropped_and_cache_is_unchanged() {
        let db = database();
        let mut log = DuckDbLog::open(Arc::clone(&db), DEFAULT_LOG_TABLE).unwrap();
        log.add(MigrationRecord::new("1_users", 1)).unwrap();

        db.execute("DROP TABLE migrations").unwrap();

        let err = log.add(MigrationRecord::new("2_seed", 1)).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(log.records(), &[MigrationRecord::new("1_users", 1)]);
    }

    #[test]
    fn test_pop_fails_when_table_dropped_and_cache_is_unchanged() {
        let db = database();
        let mut log = DuckDbLog::open(Arc::clone(&db), DEFAULT_LOG_TABLE).unwrap();
        log.add(MigrationRecord::new("1_users", 1)).unwrap();

        db.execute("DROP TABLE migrations").unwrap();

        let err = log.pop().unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(log.records().len(), 1);
    }

    #[test]
    fn test_reads_use_cached_records() {
        let db = database();
        let mut log = DuckDbLog::open(Arc::clone(&db), DEFAULT_LOG_TABLE).unwrap();
        log.add(MigrationRecord::new("1_users", 3)).unwrap();

        db.execute("DROP TABLE migrations").unwrap();

        assert!(log.contains("1_users"));
        assert_eq!(log.last_step(), 3);
    }

    #[test]
    fn test_negative_step_row_is_malformed() {
        let db = database();
        DuckDbLog::open(Arc::clone(&db), DEFAULT_LOG_TABLE).unwrap();
        db.execute("INSERT INTO migrations (name, step) VALUES ('1_users', -4)").unwrap();

        let err = DuckDbLog::open(db, DEFAULT_LOG_TABLE).err().unwrap();
        assert!(matches!(err, Error::MalformedRecord(_)));
    }

    #[test]
    fn test_zero_step_row_is_malformed() {
        let db = database();
        DuckDbLog::open(Arc::clone(&db), DEFAULT_LOG_TABLE).unwrap();
        db.execute("INSERT INTO migrations (name, step) VALUES ('1_users', 0)").unwrap();

        let err = DuckDbLog::open(db, DEFAULT_LOG_TABLE).err().unwrap();
        assert!(matches!(err, Error::MalformedRecord(_)));
    }

    #[test]
    fn test_add_rejects_invalid_record_without_writing() {
        let db = database();
        let mut log = DuckDbLog::open(Arc::clone(&db), DEFAULT_LOG_TABLE).unwrap();

        let err = log.add(MigrationRecord::new("1_a", 0)).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord(_)));
        assert_eq!(row_count(&db, DEFAULT_LOG_TABLE), 0);
        assert!(log.records().is_empty());
    }
}
