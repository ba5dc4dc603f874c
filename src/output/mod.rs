//! Output formatters for duplicate scan results.
//!
//! This module provides different output formats for scan results:
//! - Human-readable text for the terminal
//! - JSON for automation and scripting
//! - CSV for spreadsheet import
//!
//! All of them render a [`DuplicateReport`].
//!
//! # Example
//!
//! ```no_run
//! use photodedup::duplicates::DuplicateFinder;
//! use photodedup::error::ExitCode;
//! use photodedup::output::{json::JsonOutput, DuplicateReport};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//! let report = DuplicateReport::from_groups(&groups);
//!
//! let output = JsonOutput::new(&report, &summary, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod csv;
pub mod json;
pub mod report;
pub mod text;

// Re-export main types
pub use self::csv::CsvOutput;
pub use json::{JsonOutput, JsonRemovalOutput};
pub use report::{DuplicateReport, GroupReport, ReportStatus, ReportedFile};
