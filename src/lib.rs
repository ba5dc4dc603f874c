//! photodedup - staged duplicate file detection for photo folders
//!
//! Files in one directory are narrowed to byte-identical groups in stages:
//! size buckets, a BLAKE3 digest of each file's first and last bytes, then a
//! streaming BLAKE3 digest of the full content. Groups can be reported as
//! text, JSON or CSV, or reduced to a single retained copy.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use bytesize::ByteSize;

use crate::actions::{DeleteConfig, DeleteError, DeleteProgressCallback, RemovalOutcome};
use crate::cli::{Cli, Commands, OutputFormat, RemoveArgs, RemoveOutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, DuplicateGroup, FinderError, RemovalPlan, ScanSummary};
use crate::error::ExitCode;
use crate::output::{CsvOutput, DuplicateReport, JsonOutput, JsonRemovalOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::signal::ShutdownHandler;

/// Run the application for parsed CLI arguments.
///
/// # Errors
///
/// Returns an error for fatal conditions: a bad config file, a missing or
/// non-directory root, cancellation (`FinderError::Interrupted`), or a
/// failure writing the output.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let handler = signal::install_handler()?;

    match cli.command {
        Commands::Scan(args) => run_scan(args, config, &handler, cli.quiet),
        Commands::Remove(args) => run_remove(args, config, &handler, cli.quiet),
    }
}

fn find(
    path: &Path,
    config: &Config,
    handler: &ShutdownHandler,
    show_progress: bool,
) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(!show_progress));
    let finder_config = config
        .finder_config()
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);

    log::debug!("Finder configuration: {:?}", finder_config);
    DuplicateFinder::new(finder_config).find_duplicates(path)
}

fn run_scan(
    args: ScanArgs,
    mut config: Config,
    handler: &ShutdownHandler,
    quiet: bool,
) -> anyhow::Result<ExitCode> {
    args.detect.apply_to(&mut config);
    let show_progress = !quiet && args.output == OutputFormat::Text;

    let (groups, summary) = find(&args.path, &config, handler, show_progress)?;
    let report = DuplicateReport::from_groups(&groups);
    let exit_code = report.exit_code(!summary.scan_errors.is_empty());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => output::text::write_report(&mut out, &report, &summary)?,
        OutputFormat::Json => {
            JsonOutput::new(&report, &summary, exit_code).write_to(&mut out, true)?;
        }
        OutputFormat::Csv => CsvOutput::new(&report).write_to(&mut out)?,
    }
    out.flush()?;

    Ok(exit_code)
}

fn run_remove(
    args: RemoveArgs,
    mut config: Config,
    handler: &ShutdownHandler,
    quiet: bool,
) -> anyhow::Result<ExitCode> {
    args.detect.apply_to(&mut config);
    if let Some(keep) = args.keep {
        config.keep = keep;
    }
    let show_progress = !quiet && args.output == RemoveOutputFormat::Text;

    let (groups, summary) = find(&args.path, &config, handler, show_progress)?;
    if groups.is_empty() {
        log::info!("No duplicates found in {}", args.path.display());
    }

    let plans = duplicates::resolve(&groups, config.keep);
    let delete_config = DeleteConfig::default()
        .with_trash(args.trash)
        .with_verify_unchanged(!args.no_verify)
        .with_paranoid(args.paranoid)
        .with_dry_run(args.dry_run)
        .with_shutdown_flag(handler.get_flag());

    let pending: usize = plans.iter().map(|p| p.remove.len()).sum();
    if !delete_config.dry_run && !args.yes && pending > 0 && !confirm_removal(&plans)? {
        eprintln!("Aborted, nothing removed.");
        return Ok(ExitCode::Success);
    }

    if handler.is_shutdown_requested() {
        return Err(FinderError::Interrupted.into());
    }

    let outcome = actions::apply(&plans, &delete_config, Some(&RemovalLog));
    let exit_code = removal_exit_code(&groups, &summary, &outcome);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        RemoveOutputFormat::Text => {
            output::text::write_removal(&mut out, &plans, &outcome, &summary)?;
        }
        RemoveOutputFormat::Json => {
            JsonRemovalOutput::new(&outcome, &summary, exit_code).write_to(&mut out, true)?;
        }
    }
    out.flush()?;

    Ok(exit_code)
}

fn removal_exit_code(
    groups: &[DuplicateGroup],
    summary: &ScanSummary,
    outcome: &RemovalOutcome,
) -> ExitCode {
    if outcome.interrupted {
        ExitCode::Interrupted
    } else if !outcome.all_succeeded() || !summary.scan_errors.is_empty() {
        ExitCode::PartialSuccess
    } else if groups.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    }
}

/// Ask on stderr/stdin before deleting. Refuses to guess when stdin is not
/// a terminal.
fn confirm_removal(plans: &[RemovalPlan]) -> anyhow::Result<bool> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        bail!("Refusing to remove files without confirmation; pass --yes or --dry-run");
    }

    let files: usize = plans.iter().map(|p| p.remove.len()).sum();
    let bytes: u64 = plans.iter().map(RemovalPlan::reclaimable_bytes).sum();

    let mut stderr = io::stderr();
    write!(
        stderr,
        "Remove {} redundant file(s) in {} group(s), freeing {}? [y/N] ",
        files,
        plans.len(),
        ByteSize::b(bytes)
    )?;
    stderr.flush()?;

    let mut answer = String::new();
    stdin
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Deletion events routed to the log.
struct RemovalLog;

impl DeleteProgressCallback for RemovalLog {
    fn on_before_delete(&self, path: &Path, index: usize, total: usize) {
        log::debug!("[{}/{}] Removing {}", index + 1, total, path.display());
    }

    fn on_delete_success(&self, path: &Path, size: u64) {
        log::trace!("Removed {} ({})", path.display(), ByteSize::b(size));
    }

    fn on_delete_failure(&self, path: &Path, error: &DeleteError) {
        log::debug!("Kept {} after failure: {}", path.display(), error);
    }

    fn on_complete(&self, outcome: &RemovalOutcome) {
        log::debug!(
            "Removal pass finished: {} removed, {} failed",
            outcome.success_count(),
            outcome.failure_count()
        );
    }
}
