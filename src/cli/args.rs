//! CLI argument definitions using clap derive

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// shellcache - offline cache controller for the journal app shell
///
/// Installs versioned cache generations of the app shell and answers
/// requests from them, cache-first or network-first.
#[derive(Parser, Debug)]
#[command(name = "shellcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SHELLCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the configured deployment as a new generation
    Install(InstallArgs),

    /// Answer a request through the controller
    Fetch(FetchArgs),

    /// Show the registration and its generations
    Status,

    /// Inspect or clear cache generations
    Cache(CacheArgs),

    /// Work with the asset manifest
    Manifest(ManifestArgs),

    /// Manage journal entries
    Entry(EntryArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Where the controller fetches from
#[derive(Parser, Debug, Default)]
pub struct SourceArgs {
    /// Serve this directory as the origin instead of fetching over HTTP
    #[arg(long)]
    pub asset_dir: Option<PathBuf>,

    /// Simulate having no network
    #[arg(long, conflicts_with = "asset_dir")]
    pub offline: bool,
}

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(disable_version_flag = true)]
pub struct InstallArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Version tag (defaults to `controller.version`)
    #[arg(long)]
    pub version: Option<String>,

    /// Derive the version tag from the asset directory contents
    #[arg(long, requires = "asset_dir", conflicts_with = "version")]
    pub hash_version: bool,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Path or URL to request, relative to scope
    pub path: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Send as a navigation (Accept: text/html)
    #[arg(long)]
    pub html: bool,

    /// Print status and headers instead of the body
    #[arg(short = 'I', long)]
    pub head: bool,

    /// Write the body to a file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cache generations
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete generations other than the active one
    Clear {
        /// Delete every generation and forget the registration
        #[arg(long)]
        all: bool,
    },
}

/// Arguments for the manifest command
#[derive(Parser, Debug)]
pub struct ManifestArgs {
    #[command(subcommand)]
    pub action: ManifestAction,
}

/// Manifest subcommands
#[derive(Subcommand, Debug)]
pub enum ManifestAction {
    /// Print the resolved asset manifest
    Show,

    /// Print a content hash of an asset directory, usable as a version tag
    Hash {
        /// Asset directory
        dir: PathBuf,
    },
}

/// Arguments for the entry command
#[derive(Parser, Debug)]
pub struct EntryArgs {
    #[command(subcommand)]
    pub action: EntryAction,
}

/// Journal entry subcommands
#[derive(Subcommand, Debug)]
pub enum EntryAction {
    /// Add an entry
    Add {
        /// Entry title
        #[arg(short, long)]
        title: String,

        /// Entry text
        #[arg(short, long)]
        description: String,

        /// Day the entry is about, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List entries, most recent first
    List {
        /// Only entries for this day
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete an entry by id
    Delete {
        /// Entry id
        id: String,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}
