//! Migrate command - apply pending migrations

use std::path::Path;

use anyhow::Result;
use stepwise_core::Error;

use super::get_context;
use crate::output;

pub fn run(project_dir: &Path, json: bool) -> Result<()> {
    let mut ctx = get_context(project_dir)?;

    let result = match ctx.migrate() {
        Ok(result) => result,
        Err(Error::NoMigrations) => {
            if json {
                println!("{}", serde_json::json!({ "step": null, "applied": [] }));
            } else {
                output::warning("No new migrations to apply");
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for name in &result.applied {
        output::applied(name);
    }
    output::success(&format!(
        "Applied {} migration(s) as step {}",
        result.applied.len(),
        result.step
    ));
    Ok(())
}
