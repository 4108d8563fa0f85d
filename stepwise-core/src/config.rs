//! Configuration management
//!
//! Read from `stepwise.json` in the project directory:
//! ```json
//! {
//!   "migrationsDir": "migrations",
//!   "database": "stepwise.duckdb",
//!   "log": { "backend": "file", "file": "migrations/.log", "table": "migrations" },
//!   "validateSql": false
//! }
//! ```
//! Every key is optional. Keys stepwise doesn't know are kept on save.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::adapters::table_log::{is_plain_identifier, DEFAULT_LOG_TABLE};
use crate::domain::result::{Error, Result};

/// Name of the settings file inside the project directory
pub const SETTINGS_FILE: &str = "stepwise.json";

const DEFAULT_MIGRATIONS_DIR: &str = "migrations";
const DEFAULT_DATABASE: &str = "stepwise.duckdb";
const DEFAULT_LOG_FILE: &str = ".log";

/// Raw stepwise.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    migrations_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database: Option<PathBuf>,
    #[serde(default)]
    log: LogSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    validate_sql: Option<bool>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    backend: Option<LogBackend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    table: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Where the migration log is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogBackend {
    /// Text file, one `step,name` line per migration
    #[default]
    File,
    /// Table in the migrated database
    Table,
}

impl FromStr for LogBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(LogBackend::File),
            "table" => Ok(LogBackend::Table),
            other => Err(Error::config(format!(
                "Unknown log backend {:?} (expected \"file\" or \"table\")",
                other
            ))),
        }
    }
}

impl fmt::Display for LogBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogBackend::File => write!(f, "file"),
            LogBackend::Table => write!(f, "table"),
        }
    }
}

/// Stepwise configuration (resolved view of the settings)
///
/// Paths are kept as configured; use the `*_path` methods to resolve them
/// against the project directory.
#[derive(Debug, Clone)]
pub struct Config {
    pub migrations_dir: PathBuf,
    pub database: PathBuf,
    pub log_backend: LogBackend,
    pub log_file: PathBuf,
    pub log_table: String,
    pub validate_sql: bool,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_settings(SettingsFile::default())
    }
}

impl Config {
    /// Load config from the project directory
    ///
    /// Values can be overridden with the environment variables
    /// `STEPWISE_DATABASE`, `STEPWISE_MIGRATIONS_DIR` and
    /// `STEPWISE_LOG_BACKEND`.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let mut config = Self::load_file(project_dir)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn load_file(project_dir: &Path) -> Result<Self> {
        let settings_path = project_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).map_err(|e| {
                Error::config(format!("Invalid {}: {}", settings_path.display(), e))
            })?
        } else {
            SettingsFile::default()
        };

        Ok(Self::from_settings(raw))
    }

    fn from_settings(raw: SettingsFile) -> Self {
        let migrations_dir = raw
            .migrations_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MIGRATIONS_DIR));
        let log_file = raw
            .log
            .file
            .clone()
            .unwrap_or_else(|| migrations_dir.join(DEFAULT_LOG_FILE));

        Self {
            database: raw
                .database
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            log_backend: raw.log.backend.unwrap_or_default(),
            log_table: raw
                .log
                .table
                .clone()
                .unwrap_or_else(|| DEFAULT_LOG_TABLE.to_string()),
            validate_sql: raw.validate_sql.unwrap_or(false),
            migrations_dir,
            log_file,
            _raw_settings: raw,
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(database) = lookup("STEPWISE_DATABASE") {
            self.database = PathBuf::from(database);
        }
        if let Some(dir) = lookup("STEPWISE_MIGRATIONS_DIR") {
            // A log file that wasn't configured explicitly follows the scripts
            if self._raw_settings.log.file.is_none() {
                self.log_file = PathBuf::from(&dir).join(DEFAULT_LOG_FILE);
            }
            self.migrations_dir = PathBuf::from(dir);
        }
        if let Some(backend) = lookup("STEPWISE_LOG_BACKEND") {
            self.log_backend = backend.parse()?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !is_plain_identifier(&self.log_table) {
            return Err(Error::config(format!(
                "Log table name {:?} must be a plain SQL identifier",
                self.log_table
            )));
        }
        Ok(())
    }

    /// Save config to the project directory
    /// Preserves settings stepwise doesn't manage
    pub fn save(&self, project_dir: &Path) -> Result<()> {
        let settings_path = project_dir.join(SETTINGS_FILE);

        let mut settings = self._raw_settings.clone();
        settings.migrations_dir = Some(self.migrations_dir.clone());
        settings.database = Some(self.database.clone());
        settings.log.backend = Some(self.log_backend);
        settings.log.file = Some(self.log_file.clone());
        settings.log.table = Some(self.log_table.clone());
        settings.validate_sql = Some(self.validate_sql);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    pub fn migrations_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.migrations_dir)
    }

    pub fn database_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.database)
    }

    pub fn log_file_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.log_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_file(dir.path()).unwrap();

        assert_eq!(config.migrations_dir, PathBuf::from("migrations"));
        assert_eq!(config.database, PathBuf::from("stepwise.duckdb"));
        assert_eq!(config.log_backend, LogBackend::File);
        assert_eq!(config.log_file, PathBuf::from("migrations").join(".log"));
        assert_eq!(config.log_table, "migrations");
        assert!(!config.validate_sql);
    }

    #[test]
    fn test_reads_settings_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"migrationsDir": "db/scripts", "log": {"backend": "table", "table": "schema_log"}, "validateSql": true}"#,
        )
        .unwrap();

        let config = Config::load_file(dir.path()).unwrap();

        assert_eq!(config.migrations_dir, PathBuf::from("db/scripts"));
        assert_eq!(config.log_backend, LogBackend::Table);
        assert_eq!(config.log_table, "schema_log");
        assert_eq!(config.log_file, PathBuf::from("db/scripts").join(".log"));
        assert!(config.validate_sql);
    }

    #[test]
    fn test_invalid_settings_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{ not json").unwrap();

        assert!(matches!(Config::load_file(dir.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("STEPWISE_DATABASE", "/tmp/other.duckdb"),
                ("STEPWISE_MIGRATIONS_DIR", "sql"),
                ("STEPWISE_LOG_BACKEND", "TABLE"),
            ]))
            .unwrap();

        assert_eq!(config.database, PathBuf::from("/tmp/other.duckdb"));
        assert_eq!(config.migrations_dir, PathBuf::from("sql"));
        assert_eq!(config.log_file, PathBuf::from("sql").join(".log"));
        assert_eq!(config.log_backend, LogBackend::Table);
    }

    #[test]
    fn test_unknown_backend_is_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("STEPWISE_LOG_BACKEND", "redis")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unsafe_table_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"log": {"table": "log; DROP TABLE users"}}"#,
        )
        .unwrap();

        let config = Config::load_file(dir.path()).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"team": "platform", "log": {"backend": "table", "retention": 30}}"#,
        )
        .unwrap();

        let mut config = Config::load_file(dir.path()).unwrap();
        config.database = PathBuf::from("prod.duckdb");
        config.save(dir.path()).unwrap();

        let saved: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(saved["team"], "platform");
        assert_eq!(saved["database"], "prod.duckdb");
        assert_eq!(saved["log"]["backend"], "table");
        assert_eq!(saved["log"]["retention"], 30);

        let reloaded = Config::load_file(dir.path()).unwrap();
        assert_eq!(reloaded.database, PathBuf::from("prod.duckdb"));
        assert_eq!(reloaded.log_backend, LogBackend::Table);
    }
}
