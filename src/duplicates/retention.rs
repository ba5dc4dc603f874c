//! Retention policy: which copy of a duplicate group survives.
//!
//! [`resolve`] turns confirmed groups into [`RemovalPlan`]s. It never touches
//! the filesystem; [`crate::actions::delete::apply`] carries out the plans.
//!
//! # Example
//!
//! ```
//! use photodedup::duplicates::{resolve, DuplicateGroup, RetentionPolicy};
//! use photodedup::scanner::FileRecord;
//! use std::path::PathBuf;
//! use std::time::{Duration, SystemTime};
//!
//! let t = |secs| SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
//! let group = DuplicateGroup::new(
//!     [0u8; 32],
//!     10,
//!     vec![
//!         FileRecord::new(PathBuf::from("/new.jpg"), 10, t(200)),
//!         FileRecord::new(PathBuf::from("/old.jpg"), 10, t(100)),
//!     ],
//! );
//!
//! let plans = resolve(&[group], RetentionPolicy::KeepOldest);
//! assert_eq!(plans[0].keep.path, PathBuf::from("/old.jpg"));
//! ```

use serde::{Deserialize, Serialize};

use super::groups::DuplicateGroup;
use crate::scanner::FileRecord;

/// Which member of a duplicate group is retained.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum RetentionPolicy {
    /// Keep the file with the earliest modification time
    #[default]
    #[value(name = "oldest")]
    #[serde(rename = "oldest")]
    KeepOldest,
    /// Keep the file with the latest modification time
    #[value(name = "newest")]
    #[serde(rename = "newest")]
    KeepNewest,
}

impl std::fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeepOldest => write!(f, "oldest"),
            Self::KeepNewest => write!(f, "newest"),
        }
    }
}

/// The retained file of one group and the copies to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPlan {
    /// File that stays on disk
    pub keep: FileRecord,
    /// Redundant copies, in scan order
    pub remove: Vec<FileRecord>,
    /// Size shared by all members
    pub size: u64,
}

impl RemovalPlan {
    /// Bytes freed if every removal succeeds.
    #[must_use]
    pub fn reclaimable_bytes(&self) -> u64 {
        self.size * self.remove.len() as u64
    }
}

/// Pick the retained member of a group.
///
/// Members are stable-sorted by modification time, so among equal times the
/// one scanned first wins under either policy.
#[must_use]
pub fn select_keep(group: &DuplicateGroup, policy: RetentionPolicy) -> Option<usize> {
    let mut order: Vec<usize> = (0..group.files.len()).collect();
    order.sort_by_key(|&i| group.files[i].modified);

    match policy {
        RetentionPolicy::KeepOldest => order.first().copied(),
        RetentionPolicy::KeepNewest => {
            let newest = group.files[*order.last()?].modified;
            order
                .into_iter()
                .find(|&i| group.files[i].modified == newest)
        }
    }
}

/// Compute one removal plan per group.
///
/// Groups with fewer than two members produce no plan.
#[must_use]
pub fn resolve(groups: &[DuplicateGroup], policy: RetentionPolicy) -> Vec<RemovalPlan> {
    groups
        .iter()
        .filter(|g| g.len() >= 2)
        .filter_map(|group| {
            let keep_idx = select_keep(group, policy)?;
            let keep = group.files[keep_idx].clone();
            let remove: Vec<FileRecord> = group
                .files
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != keep_idx)
                .map(|(_, f)| f.clone())
                .collect();

            log::debug!(
                "Keeping {} ({} policy), removing {} copies",
                keep.path.display(),
                policy,
                remove.len()
            );

            Some(RemovalPlan {
                keep,
                remove,
                size: group.size,
            })
        })
        .collect()
}
