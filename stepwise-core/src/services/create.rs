//! Create service - new, empty script files

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::script::{sanitize_name, script_file_name};
use crate::domain::ScriptKind;

/// Timestamp used as sort key: fixed width, so it sorts chronologically
const PREFIX_FORMAT: &str = "%Y%m%d%H%M%S%9f";

/// Files written by a create call
#[derive(Debug, Clone, Serialize)]
pub struct CreatedMigration {
    pub up: String,
    pub down: Option<String>,
}

impl CreatedMigration {
    pub fn files(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.up.as_str()).chain(self.down.as_deref())
    }
}

/// Service for creating migration scripts
pub struct CreateService {
    directory: PathBuf,
}

impl CreateService {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Create a migration prefixed with the current UTC timestamp
    ///
    /// Without `pair` a single unsuffixed script is written; with `pair`
    /// an `_up`/`_down` pair sharing the same prefix.
    pub fn create(&self, name: &str, pair: bool) -> Result<CreatedMigration> {
        let prefix = Utc::now().format(PREFIX_FORMAT).to_string();
        self.create_with_prefix(name, &prefix, pair)
    }

    /// Create a migration with an explicit sort key
    pub fn create_with_prefix(
        &self,
        name: &str,
        prefix: &str,
        pair: bool,
    ) -> Result<CreatedMigration> {
        if sanitize_name(name).trim_matches('_').is_empty() {
            return Err(Error::config(format!(
                "Migration name {:?} has no alphanumeric characters",
                name
            )));
        }

        fs::create_dir_all(&self.directory)?;

        let created = if pair {
            CreatedMigration {
                up: script_file_name(prefix, name, Some(ScriptKind::Up)),
                down: Some(script_file_name(prefix, name, Some(ScriptKind::Down))),
            }
        } else {
            CreatedMigration {
                up: script_file_name(prefix, name, None),
                down: None,
            }
        };

        for file in created.files() {
            self.write_empty(file)?;
        }

        tracing::debug!(up = %created.up, "Created migration");
        Ok(created)
    }

    fn write_empty(&self, file_name: &str) -> Result<()> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.directory.join(file_name))
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    Error::config(format!("Migration {} already exists", file_name))
                }
                _ => Error::Io(e),
            })?;
        Ok(())
    }
}
