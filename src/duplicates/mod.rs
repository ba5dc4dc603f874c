//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file bucketing
//! - Sample digest filtering (head + tail + size)
//! - Full digest confirmation
//! - Retention decisions for confirmed groups

pub mod finder;
pub mod groups;
pub mod retention;

pub use finder::{
    confirm_groups, filter_by_sample, CandidateGroup, DuplicateFinder, FinderConfig, FinderError,
    PhaseStats, ScanSummary, DEFAULT_IO_THREADS,
};
pub use groups::{group_by_size, DuplicateGroup, GroupingStats};
pub use retention::{resolve, select_keep, RemovalPlan, RetentionPolicy};
