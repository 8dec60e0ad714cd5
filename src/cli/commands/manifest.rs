//! Manifest command - inspect the asset manifest

use crate::cli::args::{ManifestAction, ManifestArgs};
use crate::config::Config;
use crate::controller::{hash_directory, Deployment, Settings};
use crate::error::ShellcacheResult;
use console::style;

/// Execute the manifest command
pub async fn execute(args: ManifestArgs, config: &Config) -> ShellcacheResult<()> {
    match args.action {
        ManifestAction::Show => show_manifest(config),
        ManifestAction::Hash { dir } => {
            println!("{}", hash_directory(&dir)?);
            Ok(())
        }
    }
}

fn show_manifest(config: &Config) -> ShellcacheResult<()> {
    let settings = Settings::from_config(config)?;
    let deployment = Deployment::from_config(config)?;
    let resolved = deployment.manifest.resolve(&settings)?;

    println!(
        "{} {}",
        style("Version:").bold(),
        style(&deployment.version).cyan()
    );
    println!("{}", style("Required:").bold());
    for url in &resolved.required {
        println!("  {}", url);
    }
    println!("{}", style("Best effort:").bold());
    for url in &resolved.best_effort {
        println!("  {}", url);
    }
    Ok(())
}
