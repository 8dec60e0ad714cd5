//! Status command - show the registration and its generations

use crate::cli::args::SourceArgs;
use crate::cli::context::open_controller;
use crate::config::{Config, ConfigManager};
use crate::controller::Generation;
use crate::error::ShellcacheResult;
use crate::journal::EntryStore;
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[--] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
pub async fn execute(config: &Config) -> ShellcacheResult<()> {
    // Status never touches the network.
    let source = SourceArgs {
        offline: true,
        ..Default::default()
    };
    let controller = open_controller(config, &source).await?;
    let settings = controller.settings();
    let snapshot = controller.snapshot().await;

    println!("{}", style("shellcache status").bold().cyan());
    println!();

    println!("{}", style("Registration:").bold());
    println!("  Origin: {}", settings.origin);
    println!("  Scope:  {}", settings.scope);
    println!("  Configured version: {}", config.controller.version);
    println!();

    println!("{}", style("Active generation:").bold());
    match &snapshot.active {
        Some(active) => print_generation(active),
        None => println!("  {} None installed (run `shellcache install`)", CROSS),
    }

    let storage = controller.storage();
    let names = storage.keys().await?;
    let stale: Vec<&String> = names
        .iter()
        .filter(|n| snapshot.active.as_ref().map_or(true, |a| &a.cache_name != *n))
        .collect();
    if !stale.is_empty() {
        println!();
        println!("{}", style("Stale generations:").bold());
        for name in stale {
            println!("  {} {}", WARN, name);
        }
    }

    let journal = EntryStore::open(ConfigManager::journal_path(config)).await?;
    println!();
    println!("{}", style("Journal:").bold());
    println!("  {} entries", journal.len());

    Ok(())
}

fn print_generation(generation: &Generation) {
    println!(
        "  {} {} ({})",
        CHECK,
        style(&generation.cache_name).green(),
        generation.state
    );
    println!(
        "    since {}",
        generation.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}
