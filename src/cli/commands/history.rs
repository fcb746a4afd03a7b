//! History command - list builds left on disk

use crate::cli::args::{HistoryArgs, OutputFormat};
use crate::config::{Config, ConfigManager};
use crate::error::BuildyResult;
use crate::history::{self, HistoryEntry};
use console::style;
use std::collections::HashSet;

/// Execute the history command
///
/// Nothing is tracked outside a running server, so every build directory
/// under the base directory is listed.
pub async fn execute(args: HistoryArgs, config: &Config) -> BuildyResult<()> {
    let dir = args
        .directory
        .unwrap_or_else(|| ConfigManager::builds_dir(config));
    let entries = history::discover(&dir, &HashSet::new()).await?;

    if entries.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                println!("{} No builds in {}", style("!").yellow(), dir.display())
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&entries),
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(entries: &[HistoryEntry]) {
    println!(
        "{:<38} {:<18} {:<5}",
        style("ID").bold(),
        style("MODIFIED").bold(),
        style("LOG").bold()
    );
    println!("{}", "-".repeat(61));

    for entry in entries {
        let modified = entry
            .modified_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let log = if entry.has_log {
            style("yes").green()
        } else {
            style("no").dim()
        };

        println!("{:<38} {:<18} {:<5}", entry.id, modified, log);
    }

    println!();
    println!("{} build(s)", entries.len());
}

fn print_json(entries: &[HistoryEntry]) -> BuildyResult<()> {
    let json = serde_json::to_string_pretty(entries)?;
    println!("{}", json);
    Ok(())
}

fn print_plain(entries: &[HistoryEntry]) {
    for entry in entries {
        println!("{}", entry.id);
    }
}
