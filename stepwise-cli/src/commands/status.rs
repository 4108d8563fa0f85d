//! Status command - show applied and pending migrations

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(project_dir: &Path, json: bool) -> Result<()> {
    let ctx = get_context(project_dir)?;
    let status = ctx.status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Migration Status".bold());
    println!();

    let mut table = output::create_table(&["Migration", "Step", "State"]);
    for record in &status.applied {
        table.add_row(vec![
            record.name.clone(),
            record.step.to_string(),
            "applied".to_string(),
        ]);
    }
    for name in &status.pending {
        table.add_row(vec![name.clone(), "-".to_string(), "pending".to_string()]);
    }

    if status.applied.is_empty() && status.pending.is_empty() {
        output::info(&format!(
            "No migrations in {}",
            ctx.source.root().display()
        ));
        return Ok(());
    }

    println!("{}", table);
    println!();
    println!("Last step: {}", status.last_step);
    if status.pending.is_empty() {
        output::success("Up to date");
    } else {
        output::warning(&format!("{} pending migration(s)", status.pending.len()));
    }

    Ok(())
}
