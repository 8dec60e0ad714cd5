//! Cache command - inspect and clear cache generations

use crate::cli::args::{CacheAction, CacheArgs, OutputFormat, SourceArgs};
use crate::cli::context::open_controller;
use crate::config::{Config, ConfigManager};
use crate::controller::RegistrationRecord;
use crate::error::ShellcacheResult;
use console::style;
use serde::Serialize;
use tracing::debug;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> ShellcacheResult<()> {
    match args.action {
        CacheAction::List { format } => list_caches(config, format).await,
        CacheAction::Clear { all } => clear_caches(config, all).await,
    }
}

#[derive(Serialize)]
struct GenerationInfo {
    name: String,
    entries: usize,
    active: bool,
}

async fn collect(config: &Config) -> ShellcacheResult<Vec<GenerationInfo>> {
    let source = SourceArgs {
        offline: true,
        ..Default::default()
    };
    let controller = open_controller(config, &source).await?;
    let active = controller.snapshot().await.active.map(|g| g.cache_name);
    let storage = controller.storage();

    let mut generations = vec![];
    for name in storage.keys().await? {
        let entries = storage.entries(&name).await?.len();
        generations.push(GenerationInfo {
            active: active.as_deref() == Some(name.as_str()),
            name,
            entries,
        });
    }
    Ok(generations)
}

/// List cache generations
async fn list_caches(config: &Config, format: OutputFormat) -> ShellcacheResult<()> {
    let generations = collect(config).await?;

    if generations.is_empty() {
        println!("No cache generations found.");
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_table(&generations),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&generations)?),
        OutputFormat::Plain => {
            for generation in &generations {
                println!("{}", generation.name);
            }
        }
    }

    Ok(())
}

fn print_table(generations: &[GenerationInfo]) {
    println!("{:<40} {:<10} {:<10}", "GENERATION", "ENTRIES", "STATE");
    println!("{}", "-".repeat(60));

    for generation in generations {
        let state = if generation.active {
            style("active").green().to_string()
        } else {
            style("stale").dim().to_string()
        };
        println!(
            "{:<40} {:<10} {:<10}",
            generation.name, generation.entries, state
        );
    }

    println!();
    println!("Total: {} generation(s)", generations.len());
}

/// Delete stale generations, or everything with `all`
async fn clear_caches(config: &Config, all: bool) -> ShellcacheResult<()> {
    let source = SourceArgs {
        offline: true,
        ..Default::default()
    };
    let controller = open_controller(config, &source).await?;
    let active = controller.snapshot().await.active.map(|g| g.cache_name);
    let storage = controller.storage();

    let mut removed = 0;
    for name in storage.keys().await? {
        if !all && active.as_deref() == Some(name.as_str()) {
            continue;
        }
        if storage.delete(&name).await? {
            debug!("Deleted {}", name);
            removed += 1;
        }
    }

    if all {
        RegistrationRecord::delete(&ConfigManager::registration_path(config)).await?;
    }

    println!(
        "{} Removed {} generation(s)",
        style("✓").green(),
        removed
    );
    Ok(())
}
