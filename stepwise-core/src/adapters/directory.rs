//! Local filesystem script source

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::result::{Error, Result};
use crate::ports::ScriptSource;

/// Scripts stored as files directly inside one directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ScriptSource for DirectorySource {
    fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| Error::Source {
            script: self.root.display().to_string(),
            source: e,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            // Sub-directories are never scripts
            if entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<String> {
        fs::read_to_string(self.root.join(name)).map_err(|e| Error::Source {
            script: name.to_string(),
            source: e,
        })
    }

    fn exists(&self, name: &str) -> bool {
        self.root.join(name).is_file()
    }
}
