//! Entry command - manage journal entries

use crate::cli::args::{EntryAction, EntryArgs, OutputFormat};
use crate::config::{Config, ConfigManager};
use crate::error::ShellcacheResult;
use crate::journal::{Entry, EntryStore};
use chrono::Local;
use console::style;

/// Execute the entry command
pub async fn execute(args: EntryArgs, config: &Config) -> ShellcacheResult<()> {
    let mut store = EntryStore::open(ConfigManager::journal_path(config)).await?;

    match args.action {
        EntryAction::Add {
            title,
            description,
            date,
        } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let entry = store.add(Entry::new(&title, &description, date)?).await?;
            println!(
                "{} Added entry {} for {}",
                style("✓").green(),
                style(&entry.id).cyan(),
                entry.date
            );
        }
        EntryAction::List { date, format } => {
            let entries = match date {
                Some(date) => store.on_date(date),
                None => store.list(),
            };
            print_entries(&entries, format)?;
        }
        EntryAction::Delete { id } => {
            let removed = store.delete(&id).await?;
            println!(
                "{} Deleted \"{}\"",
                style("✓").green(),
                removed.title
            );
        }
    }

    Ok(())
}

fn print_entries(entries: &[&Entry], format: OutputFormat) -> ShellcacheResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Plain => {
            for entry in entries {
                println!("{}\t{}\t{}", entry.id, entry.date, entry.title);
            }
        }
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("No entries found.");
                return Ok(());
            }
            for entry in entries {
                println!(
                    "{}  {}  {}",
                    style(entry.date.format("%d/%m/%Y")).cyan(),
                    style(&entry.title).bold(),
                    style(&entry.id).dim()
                );
                println!("    {}", entry.description);
            }
            println!();
            println!("Total: {} entry(ies)", entries.len());
        }
    }
    Ok(())
}
