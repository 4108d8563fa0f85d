//! Script catalog - which scripts exist and in what order they run
//!
//! Execution order is the lexicographic order of the file names, so the
//! sort key in front of every name (a zero-padded counter or a fixed-width
//! timestamp) must sort chronologically. Nothing here checks that.

use crate::domain::result::Result;
use crate::domain::script::{down_script_name, parse_script_name};
use crate::domain::ScriptKind;
use crate::ports::{MigrationLog, ScriptSource};

/// An up script and the logical migration name it is logged under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpScript {
    pub file_name: String,
    pub name: String,
}

/// Read-only view of a script source organised by the naming convention
pub struct MigrationCatalog<'a> {
    source: &'a dyn ScriptSource,
}

impl<'a> MigrationCatalog<'a> {
    pub fn new(source: &'a dyn ScriptSource) -> Self {
        Self { source }
    }

    /// Up scripts sorted ascending by file name
    ///
    /// Skips down scripts, files that aren't `.sql`, and the log's own file
    /// when it is stored alongside the scripts.
    pub fn up_scripts(&self, log: &dyn MigrationLog) -> Result<Vec<UpScript>> {
        let log_file = log
            .storage_file()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str());

        let mut files = self.source.list()?;
        files.sort();

        let scripts = files
            .into_iter()
            .filter(|file| Some(file.as_str()) != log_file)
            .filter_map(|file| {
                let parsed = parse_script_name(&file)?;
                (parsed.kind == ScriptKind::Up).then(|| UpScript {
                    file_name: file,
                    name: parsed.name,
                })
            })
            .collect();

        Ok(scripts)
    }

    /// Up scripts whose migration is not in the log yet
    pub fn pending(&self, log: &dyn MigrationLog) -> Result<Vec<UpScript>> {
        let mut pending: Vec<UpScript> = Vec::new();
        for script in self.up_scripts(log)? {
            // `1_a.sql` and `1_a_up.sql` are the same migration
            if log.contains(&script.name) || pending.iter().any(|p| p.name == script.name) {
                continue;
            }
            pending.push(script);
        }
        Ok(pending)
    }

    /// File name of the down script for a migration, if there is one
    pub fn down_script(&self, name: &str) -> Option<String> {
        let file_name = down_script_name(name);
        self.source.exists(&file_name).then_some(file_name)
    }

    pub fn read(&self, file_name: &str) -> Result<String> {
        self.source.read(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryLog, MemorySource};
    use crate::adapters::FileLog;
    use crate::domain::MigrationRecord;
    use tempfile::TempDir;

    fn names(scripts: &[UpScript]) -> Vec<&str> {
        scripts.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_up_scripts_sorted_and_down_scripts_skipped() {
        let source = MemorySource::new()
            .with_script("2_seed_up.sql", "")
            .with_script("2_seed_down.sql", "")
            .with_script("1_users.sql", "")
            .with_script("1_users_down.sql", "")
            .with_script("notes.txt", "");
        let catalog = MigrationCatalog::new(&source);

        let scripts = catalog.up_scripts(&MemoryLog::new()).unwrap();
        assert_eq!(names(&scripts), vec!["1_users", "2_seed"]);
        assert_eq!(scripts[1].file_name, "2_seed_up.sql");
    }

    #[test]
    fn test_log_file_is_excluded() {
        let dir = TempDir::new().unwrap();
        let log = FileLog::open(dir.path().join("0_log.sql")).unwrap();
        let source = MemorySource::new()
            .with_script("0_log.sql", "")
            .with_script("1_users_up.sql", "");
        let catalog = MigrationCatalog::new(&source);

        let scripts = catalog.up_scripts(&log).unwrap();
        assert_eq!(names(&scripts), vec!["1_users"]);
    }

    #[test]
    fn test_pending_skips_logged_migrations() {
        let source = MemorySource::new()
            .with_script("1_users_up.sql", "")
            .with_script("2_seed_up.sql", "");
        let mut log = MemoryLog::new();
        log.add(MigrationRecord::new("1_users", 1)).unwrap();

        let pending = MigrationCatalog::new(&source).pending(&log).unwrap();
        assert_eq!(names(&pending), vec!["2_seed"]);
    }

    #[test]
    fn test_down_script_lookup() {
        let source = MemorySource::new()
            .with_script("1_users_up.sql", "")
            .with_script("1_users_down.sql", "");
        let catalog = MigrationCatalog::new(&source);

        assert_eq!(catalog.down_script("1_users").as_deref(), Some("1_users_down.sql"));
        assert_eq!(catalog.down_script("2_seed"), None);
    }
}
