//! Duplicate report: metrics over confirmed groups.
//!
//! The report is the single source for every rendering ([`super::text`],
//! [`super::json`], [`super::csv`]), so all of them agree on the numbers.

use std::path::PathBuf;
use std::time::SystemTime;

use serde::Serialize;

use crate::duplicates::DuplicateGroup;
use crate::error::ExitCode;

/// Whether any duplicates were found.
///
/// `NoDuplicates` is a normal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// The scan completed and found no duplicate groups
    NoDuplicates,
    /// The scan completed and found at least one group
    DuplicatesFound,
}

/// One member of a reported group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedFile {
    /// Path to the file
    pub path: PathBuf,
    /// Modification time recorded at scan time
    pub modified: SystemTime,
}

/// Per-group detail of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    /// Digest as lowercase hex
    pub digest: String,
    /// Size shared by every member
    pub size: u64,
    /// Members in scan order
    pub files: Vec<ReportedFile>,
    /// `size x (files - 1)`
    pub reclaimable_bytes: u64,
}

/// Aggregate metrics over a set of duplicate groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateReport {
    /// Whether any duplicates were found
    pub status: ReportStatus,
    /// Number of groups
    pub group_count: usize,
    /// Every member of every group
    pub total_duplicate_files: usize,
    /// Members beyond the one retained copy per group
    pub redundant_files: usize,
    /// Bytes freed by keeping one copy per group
    pub reclaimable_bytes: u64,
    /// Per-group detail, in the order the groups were given
    pub groups: Vec<GroupReport>,
}

impl DuplicateReport {
    /// Build a report from confirmed groups.
    ///
    /// Sizes come from the scan inventory; files are not re-read.
    ///
    /// # Example
    ///
    /// ```
    /// use photodedup::output::{DuplicateReport, ReportStatus};
    ///
    /// let report = DuplicateReport::from_groups(&[]);
    /// assert_eq!(report.status, ReportStatus::NoDuplicates);
    /// assert_eq!(report.reclaimable_bytes, 0);
    /// ```
    #[must_use]
    pub fn from_groups(groups: &[DuplicateGroup]) -> Self {
        let groups: Vec<GroupReport> = groups
            .iter()
            .map(|g| GroupReport {
                digest: g.digest_hex(),
                size: g.size,
                files: g
                    .files
                    .iter()
                    .map(|f| ReportedFile {
                        path: f.path.clone(),
                        modified: f.modified,
                    })
                    .collect(),
                reclaimable_bytes: g.reclaimable_bytes(),
            })
            .collect();

        let status = if groups.is_empty() {
            ReportStatus::NoDuplicates
        } else {
            ReportStatus::DuplicatesFound
        };

        Self {
            status,
            group_count: groups.len(),
            total_duplicate_files: groups.iter().map(|g| g.files.len()).sum(),
            redundant_files: groups.iter().map(|g| g.files.len().saturating_sub(1)).sum(),
            reclaimable_bytes: groups.iter().map(|g| g.reclaimable_bytes).sum(),
            groups,
        }
    }

    /// Exit code for a scan that produced this report.
    #[must_use]
    pub fn exit_code(&self, had_errors: bool) -> ExitCode {
        match (self.status, had_errors) {
            (_, true) => ExitCode::PartialSuccess,
            (ReportStatus::NoDuplicates, false) => ExitCode::NoDuplicates,
            (ReportStatus::DuplicatesFound, false) => ExitCode::Success,
        }
    }
}
