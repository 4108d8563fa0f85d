//! Init command - set up a stepwise project

use std::path::Path;

use anyhow::{Context, Result};
use stepwise_core::config::{Config, SETTINGS_FILE};

use super::get_context;
use crate::output;

pub fn run(project_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(project_dir)
        .with_context(|| format!("Failed to create project directory: {:?}", project_dir))?;

    let settings_path = project_dir.join(SETTINGS_FILE);
    if settings_path.exists() {
        output::info(&format!("Using existing {}", settings_path.display()));
    } else {
        Config::default().save(project_dir)?;
        output::info(&format!("Wrote {}", settings_path.display()));
    }

    let config = Config::load(project_dir)?;
    let migrations_dir = config.migrations_path(project_dir);
    std::fs::create_dir_all(&migrations_dir).with_context(|| {
        format!(
            "Failed to create migrations directory: {:?}",
            migrations_dir
        )
    })?;

    // Opening the project creates the database and the log store
    let ctx = get_context(project_dir)?;

    output::success(&format!(
        "Initialized stepwise in {} (log backend: {})",
        ctx.project_dir.display(),
        ctx.config.log_backend
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_project() {
        let dir = TempDir::new().unwrap();

        run(dir.path()).unwrap();

        assert!(dir.path().join(SETTINGS_FILE).is_file());
        assert!(dir.path().join("migrations").is_dir());
        assert!(dir.path().join("migrations").join(".log").is_file());
    }

    #[test]
    fn test_init_keeps_existing_settings() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"migrationsDir": "sql", "owner": "data-team"}"#,
        )
        .unwrap();

        run(dir.path()).unwrap();
        run(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap();
        assert!(content.contains("data-team"));
        assert!(dir.path().join("sql").join(".log").is_file());
    }
}
