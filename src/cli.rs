//! Command-line interface definitions for photodedup.
//!
//! This module defines all CLI arguments, subcommands, and options using the
//! clap derive API: global options (verbosity, colour, config file) and one
//! subcommand per operation.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates in a folder
//! photodedup scan ~/Pictures/import
//!
//! # Include small files, JSON for scripting
//! photodedup scan ~/Pictures/import --min-size 0 --output json
//!
//! # Show what would be removed, keeping the newest copy
//! photodedup remove ~/Pictures/import --keep newest --dry-run
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::duplicates::RetentionPolicy;

/// Duplicate photo finder.
///
/// Finds byte-identical files in a folder by size, then a sampled BLAKE3
/// digest, then a full BLAKE3 digest, and optionally removes the redundant
/// copies.
#[derive(Debug, Parser)]
#[command(name = "photodedup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Read settings from this TOML file instead of the platform default
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report duplicate files in a directory
    Scan(ScanArgs),
    /// Remove redundant copies, keeping one file per group
    Remove(RemoveArgs),
}

/// Options that control duplicate detection.
///
/// Unset options fall back to the configuration file and environment.
#[derive(Debug, Clone, Default, Args)]
pub struct DetectArgs {
    /// Minimum file size to consider (e.g., 0, 1KiB, 2MB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Bytes sampled from each end of a file (e.g., 8KiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub sample_size: Option<u64>,

    /// Skip the sample digest and go straight to full digests
    #[arg(long)]
    pub no_sample_hash: bool,

    /// Number of concurrent digest workers (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub io_threads: Option<u64>,
}

impl DetectArgs {
    /// Apply these flags on top of a loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(min_size) = self.min_size {
            config.min_size = min_size;
        }
        if let Some(sample_size) = self.sample_size {
            config.sample_size = sample_size;
        }
        if self.no_sample_hash {
            config.use_sample_hash = false;
        }
        if let Some(threads) = self.io_threads {
            config.io_threads = usize::try_from(threads).unwrap_or(usize::MAX);
        }
    }
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan (direct entries only)
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    #[command(flatten)]
    pub detect: DetectArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the remove subcommand.
#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Directory to deduplicate (direct entries only)
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    #[command(flatten)]
    pub detect: DetectArgs,

    /// Which copy of each group to keep
    #[arg(long, value_enum)]
    pub keep: Option<RetentionPolicy>,

    /// Show what would be removed without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Move files to the system trash instead of deleting them
    #[arg(long)]
    pub trash: bool,

    /// Compare bytes with the kept copy before each deletion
    #[arg(long)]
    pub paranoid: bool,

    /// Do not re-check size and modification time before deletion
    #[arg(long)]
    pub no_verify: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: RemoveOutputFormat,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON for scripting
    Json,
    /// One CSV row per duplicate file
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Output format for removal results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RemoveOutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON for scripting
    Json,
}

/// Parse a human-readable size string into bytes.
///
/// Decimal suffixes (KB, MB, ...) are powers of 1000, binary suffixes (KiB,
/// MiB, ...) powers of 1024. Suffixes are case-insensitive.
///
/// # Errors
///
/// Returns a message if the number or suffix is not recognised.
///
/// # Examples
///
/// ```
/// use photodedup::cli::parse_size;
///
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1.5MB").unwrap(), 1_500_000);
/// assert!(parse_size("10XB").is_err());
/// ```
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
