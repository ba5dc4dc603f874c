//! Human-readable terminal output.
//!
//! Colours come from [`yansi`]; call `yansi::disable()` beforehand for plain
//! text. Sizes are rendered with [`bytesize`].

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::Paint;

use super::report::{DuplicateReport, ReportStatus};
use crate::actions::RemovalOutcome;
use crate::duplicates::{RemovalPlan, ScanSummary};

/// Write a scan report.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_report<W: Write>(
    writer: &mut W,
    report: &DuplicateReport,
    summary: &ScanSummary,
) -> io::Result<()> {
    for (idx, group) in report.groups.iter().enumerate() {
        writeln!(
            writer,
            "{} {} x {} ({} reclaimable)",
            format!("Group {}:", idx + 1).bold(),
            group.files.len(),
            ByteSize::b(group.size),
            ByteSize::b(group.reclaimable_bytes).green()
        )?;
        for file in &group.files {
            writeln!(writer, "  {}", file.path.display())?;
        }
        writeln!(writer)?;
    }

    write_errors(writer, summary)?;

    match report.status {
        ReportStatus::NoDuplicates => {
            writeln!(
                writer,
                "{} ({} files scanned)",
                "No duplicates found.".green().bold(),
                summary.total_files
            )?;
        }
        ReportStatus::DuplicatesFound => {
            writeln!(
                writer,
                "{} {} groups, {} files, {} redundant, {} reclaimable ({} files scanned in {:.2?})",
                "Summary:".bold(),
                report.group_count,
                report.total_duplicate_files,
                report.redundant_files,
                ByteSize::b(report.reclaimable_bytes).green().bold(),
                summary.total_files,
                summary.scan_duration
            )?;
        }
    }
    Ok(())
}

/// Write the plan and outcome of a removal.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_removal<W: Write>(
    writer: &mut W,
    plans: &[RemovalPlan],
    outcome: &RemovalOutcome,
    summary: &ScanSummary,
) -> io::Result<()> {
    for plan in plans {
        writeln!(writer, "{} {}", "keep".green(), plan.keep.path.display())?;
        for record in &plan.remove {
            let failure = outcome.failures.iter().find(|(p, _)| *p == record.path);
            match failure {
                Some((_, err)) => {
                    writeln!(writer, "  {} {}: {}", "fail".red(), record.path.display(), err)?;
                }
                None if !outcome.was_removed(&record.path) => {
                    writeln!(writer, "  {} {}", "skipped".dim(), record.path.display())?;
                }
                None if outcome.dry_run => {
                    writeln!(writer, "  {} {}", "would delete".yellow(), record.path.display())?;
                }
                None => {
                    writeln!(writer, "  {} {}", "deleted".yellow(), record.path.display())?;
                }
            }
        }
    }

    write_errors(writer, summary)?;

    let line = outcome.summary();
    if outcome.all_succeeded() {
        writeln!(writer, "{}", line.green().bold())?;
    } else {
        writeln!(writer, "{}", line.yellow().bold())?;
    }
    Ok(())
}

fn write_errors<W: Write>(writer: &mut W, summary: &ScanSummary) -> io::Result<()> {
    if summary.scan_errors.is_empty() {
        return Ok(());
    }
    writeln!(
        writer,
        "{}",
        format!("{} file(s) could not be read:", summary.scan_errors.len())
            .yellow()
            .bold()
    )?;
    for err in &summary.scan_errors {
        writeln!(writer, "  {err}")?;
    }
    writeln!(writer)
}
