//! Create command - new migration scripts

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use stepwise_core::config::Config;
use stepwise_core::services::CreateService;

pub fn run(project_dir: &Path, name: &str, pair: bool) -> Result<()> {
    let config = Config::load(project_dir)?;
    let service = CreateService::new(config.migrations_path(project_dir));

    let created = service.create(name, pair)?;

    for file in created.files() {
        println!(
            "{} {}",
            "Created".green(),
            service.directory().join(file).display()
        );
    }
    Ok(())
}
