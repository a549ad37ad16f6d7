//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// distfinder -- distribution checksum mapping and license harvesting.
///
/// Use `distfinder <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "distfinder", version, about, long_about = None)]
pub struct Cli {
    /// Path to the distfinder.toml configuration file.
    #[arg(short, long, default_value = "distfinder.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze distributions and map every nested file to its checksums.
    Analyze(AnalyzeArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- analyze ----

/// Analyze one or more distributions (archives, files, or directories).
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Inputs to analyze (paths or file:// URIs).
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Digest types to compute (md5, sha1, sha256). Repeatable; overrides the config file.
    #[arg(short = 't', long = "checksum-type")]
    pub checksum_types: Vec<String>,

    /// Only open top-level distribution archives (and singleton tars).
    #[arg(long)]
    pub disable_recursion: bool,

    /// Exclude files whose normalized path fully matches this regex. Repeatable.
    #[arg(long = "exclude")]
    pub excludes: Vec<String>,

    /// Only checksum files with this extension. Repeatable.
    #[arg(long = "archive-extension")]
    pub archive_extensions: Vec<String>,

    /// Directory for checksums-<type>.json and licenses.json.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Checksum cache directory.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// License mapping JSON file.
    #[arg(long)]
    pub license_mapping: Option<PathBuf>,

    /// Do not write the JSON result files.
    #[arg(long)]
    pub no_write: bool,
}

// ---- config ----

/// Manage distfinder configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, analyzer).
        #[arg(long)]
        section: Option<String>,
    },
}
