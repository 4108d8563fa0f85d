//! Terminal output for stepwise commands
//!
//! Results go to stdout, errors to stderr. Colors are dropped automatically
//! when the output isn't a terminal.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};

pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error and its causes, one per line
pub fn error(err: &anyhow::Error) {
    eprintln!("{} {}", "error:".red().bold(), err);
    for cause in err.chain().skip(1) {
        eprintln!("  {} {}", "caused by:".red(), cause);
    }
}

/// No-op outcomes and other things worth noticing
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// One migration applied by `migrate`
pub fn applied(name: &str) {
    println!("  {} {}", "↑".green(), name);
}

/// One migration removed by `rollback`
pub fn reverted(name: &str, irreversible: bool) {
    if irreversible {
        println!("  {} {} {}", "↓".yellow(), name, "(no down script)".dimmed());
    } else {
        println!("  {} {}", "↓".green(), name);
    }
}

/// Table with the stepwise preset and the given header
pub fn create_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.to_vec());
    table
}
