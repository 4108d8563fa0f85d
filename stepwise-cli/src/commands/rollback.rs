//! Rollback command - revert the most recent step

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;
use stepwise_core::Error;

use super::get_context;
use crate::output;

pub fn run(project_dir: &Path, force: bool, json: bool) -> Result<()> {
    let mut ctx = get_context(project_dir)?;

    let step = ctx.log.last_step();
    if step == 0 {
        return nothing_to_roll_back(json);
    }

    // Confirm unless --force
    if !force {
        let batch: Vec<_> = ctx
            .log
            .records()
            .iter()
            .rev()
            .take_while(|r| r.step == step)
            .map(|r| r.name.as_str())
            .collect();

        println!(
            "\n{}",
            format!("This will revert step {}:", step).yellow()
        );
        for name in &batch {
            println!("  {}", name);
        }
        println!();

        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let result = match ctx.rollback() {
        Ok(result) => result,
        Err(Error::NothingToRollBack) => return nothing_to_roll_back(json),
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for name in &result.reverted {
        output::reverted(name, result.irreversible.contains(name));
    }
    output::success(&format!(
        "Rolled back {} migration(s) from step {}",
        result.reverted.len(),
        result.step
    ));
    Ok(())
}

fn nothing_to_roll_back(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::json!({ "step": null, "reverted": [] }));
    } else {
        output::warning("Nothing to roll back");
    }
    Ok(())
}
