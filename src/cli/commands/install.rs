//! Install command - register the configured deployment

use crate::cli::args::InstallArgs;
use crate::cli::context::{open_controller, save_record};
use crate::config::Config;
use crate::controller::{hash_directory, Deployment, InstallSummary, RegisterOutcome};
use crate::error::ShellcacheResult;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config) -> ShellcacheResult<()> {
    let mut deployment = Deployment::from_config(config)?;

    if let Some(version) = args.version {
        deployment = Deployment::new(version, deployment.manifest)?;
    } else if let (true, Some(dir)) = (args.hash_version, args.source.asset_dir.as_ref()) {
        deployment = Deployment::new(hash_directory(dir)?, deployment.manifest)?;
    }

    let controller = open_controller(config, &args.source).await?;

    let pb = create_progress_bar(&format!("Installing {}", deployment.version));
    let result = controller.register(&deployment).await;
    pb.finish_and_clear();
    let outcome = result?;

    save_record(&controller, config).await?;

    match outcome {
        RegisterOutcome::Unchanged { version } => {
            println!(
                "{} Version {} is already installed",
                style("✓").green(),
                style(version).cyan()
            );
        }
        RegisterOutcome::Activated { version, summary } => {
            println!(
                "{} Activated {} ({} assets cached)",
                style("✓").green(),
                style(&version).cyan(),
                summary.cached.len()
            );
            print_skipped(&summary);
        }
        RegisterOutcome::Waiting { version, summary } => {
            println!(
                "{} Installed {}, waiting for open clients to close",
                style("~").yellow(),
                style(&version).cyan()
            );
            print_skipped(&summary);
        }
    }

    Ok(())
}

fn print_skipped(summary: &InstallSummary) {
    for skipped in &summary.skipped {
        println!(
            "  {} skipped {}: {}",
            style("!").yellow(),
            skipped.url,
            style(&skipped.reason).dim()
        );
    }
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
