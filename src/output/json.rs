//! JSON output formatter for scan and removal results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "status": "duplicates_found",
//!   "duplicates": [
//!     {
//!       "hash": "abc123...",
//!       "size": 1024,
//!       "reclaimable_bytes": 1024,
//!       "files": [
//!         {"path": "/photos/a.jpg", "modified": "2024-05-01T10:00:00+00:00"},
//!         {"path": "/photos/b.jpg", "modified": "2024-05-02T10:00:00+00:00"}
//!       ]
//!     }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "duplicate_groups": 1,
//!     "total_duplicate_files": 2,
//!     "redundant_files": 1,
//!     "reclaimable_bytes": 1024,
//!     "scan_duration_ms": 12,
//!     "exit_code": 0,
//!     "exit_code_name": "PD000"
//!   },
//!   "errors": []
//! }
//! ```

use std::io::Write;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::report::{DuplicateReport, GroupReport, ReportStatus};
use crate::actions::RemovalOutcome;
use crate::duplicates::ScanSummary;
use crate::error::ExitCode;
use crate::scanner::ScanError;

/// Format a timestamp as RFC 3339 in UTC.
pub(crate) fn rfc3339(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.to_rfc3339()
}

/// One file of a duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFile {
    /// Path to the file
    pub path: String,
    /// Modification time (RFC 3339)
    pub modified: String,
}

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// BLAKE3 hash as hexadecimal string (64 characters)
    pub hash: String,
    /// File size in bytes
    pub size: u64,
    /// Bytes freed by keeping one copy
    pub reclaimable_bytes: u64,
    /// Members in scan order
    pub files: Vec<JsonFile>,
}

impl JsonDuplicateGroup {
    fn from_group_report(group: &GroupReport) -> Self {
        Self {
            hash: group.digest.clone(),
            size: group.size,
            reclaimable_bytes: group.reclaimable_bytes,
            files: group
                .files
                .iter()
                .map(|f| JsonFile {
                    path: f.path.to_string_lossy().into_owned(),
                    modified: rfc3339(f.modified),
                })
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Total number of files scanned
    pub total_files: usize,
    /// Total size of all scanned files in bytes
    pub total_size: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Every member of every group
    pub total_duplicate_files: usize,
    /// Members beyond the retained copy of each group
    pub redundant_files: usize,
    /// Total space that can be reclaimed by removing duplicates (bytes)
    pub reclaimable_bytes: u64,
    /// Bytes read by the digest phases
    pub bytes_read: u64,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "PD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a report, the scan summary and an exit code.
    #[must_use]
    pub fn new(report: &DuplicateReport, summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            duplicate_groups: report.group_count,
            total_duplicate_files: report.total_duplicate_files,
            redundant_files: report.redundant_files,
            reclaimable_bytes: report.reclaimable_bytes,
            bytes_read: summary.bytes_read,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output of a scan.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Whether any duplicates were found
    pub status: ReportStatus,
    /// List of duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
    /// Files that could not be read
    pub errors: Vec<ScanError>,
}

impl JsonOutput {
    /// Create a new JSON output from a report, summary and exit code.
    ///
    /// # Example
    ///
    /// ```
    /// use photodedup::duplicates::ScanSummary;
    /// use photodedup::error::ExitCode;
    /// use photodedup::output::{json::JsonOutput, DuplicateReport};
    ///
    /// let report = DuplicateReport::from_groups(&[]);
    /// let output = JsonOutput::new(&report, &ScanSummary::default(), ExitCode::NoDuplicates);
    /// let json = output.to_json().unwrap();
    /// assert!(json.contains("\"no_duplicates\""));
    /// ```
    #[must_use]
    pub fn new(report: &DuplicateReport, summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            status: report.status,
            duplicates: report
                .groups
                .iter()
                .map(JsonDuplicateGroup::from_group_report)
                .collect(),
            summary: JsonSummary::new(report, summary, exit_code),
            errors: summary.scan_errors.clone(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        write_json(self, writer, pretty)
    }
}

/// A failed removal in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFailure {
    /// Path that could not be removed
    pub path: String,
    /// Reason
    pub error: String,
}

/// Complete JSON output of a removal.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRemovalOutput {
    /// Whether nothing was actually deleted
    pub dry_run: bool,
    /// Paths removed (or that would be removed)
    pub removed: Vec<String>,
    /// Paths that could not be removed
    pub failures: Vec<JsonFailure>,
    /// Bytes freed
    pub bytes_freed: u64,
    /// Whether shutdown stopped the removal early
    pub interrupted: bool,
    /// Files that could not be read during the scan
    pub scan_errors: Vec<ScanError>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name
    pub exit_code_name: String,
}

impl JsonRemovalOutput {
    /// Create the JSON output of a removal.
    #[must_use]
    pub fn new(outcome: &RemovalOutcome, summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            dry_run: outcome.dry_run,
            removed: outcome
                .removed
                .iter()
                .map(|r| r.path.to_string_lossy().into_owned())
                .collect(),
            failures: outcome
                .failures
                .iter()
                .map(|(path, err)| JsonFailure {
                    path: path.to_string_lossy().into_owned(),
                    error: err.to_string(),
                })
                .collect(),
            bytes_freed: outcome.bytes_freed,
            interrupted: outcome.interrupted,
            scan_errors: summary.scan_errors.clone(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        write_json(self, writer, pretty)
    }
}

fn write_json<T: Serialize, W: Write>(
    value: &T,
    writer: &mut W,
    pretty: bool,
) -> Result<(), JsonOutputError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
