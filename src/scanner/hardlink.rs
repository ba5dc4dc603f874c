//! Recognition of directory entries that name a file already listed.
//!
//! # Overview
//!
//! A hard link or a symlink to a sibling is a second name for one file on
//! disk, not a second copy. Listing both would form a group whose "copies"
//! free nothing when removed, so the walker keeps only the first name it
//! meets for each file.
//!
//! # Platform Support
//!
//! - **Unix**: (device, inode) of the followed metadata, which covers hard
//!   links and symlinks alike
//! - **Other**: the canonical path, which covers symlinks only
//!
//! # Example
//!
//! ```no_run
//! use photodedup::scanner::hardlink::HardlinkTracker;
//! use std::path::Path;
//!
//! let mut tracker = HardlinkTracker::new();
//! for name in ["a.jpg", "a_link.jpg"] {
//!     let path = Path::new(name);
//!     let meta = std::fs::metadata(path).unwrap();
//!     if let Some(first) = tracker.check_and_record(path, &meta) {
//!         println!("{} is {}", path.display(), first.display());
//!     }
//! }
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Identity of a file on disk, independent of the name used to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileId {
    /// Device and inode number
    #[cfg(unix)]
    Inode {
        /// Device ID
        dev: u64,
        /// Inode number
        ino: u64,
    },
    /// Fully resolved path
    #[cfg(not(unix))]
    Canonical(PathBuf),
}

impl FileId {
    /// Identity of the file at `path`, given metadata that followed symlinks.
    ///
    /// Returns `None` when the identity cannot be determined.
    #[cfg(unix)]
    #[must_use]
    pub fn of(_path: &Path, metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self::Inode {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    /// Identity of the file at `path`, given metadata that followed symlinks.
    ///
    /// Returns `None` when the identity cannot be determined.
    #[cfg(not(unix))]
    #[must_use]
    pub fn of(path: &Path, _metadata: &Metadata) -> Option<Self> {
        std::fs::canonicalize(path).ok().map(Self::Canonical)
    }
}

/// Remembers the first name seen for each file.
///
/// Not thread-safe; the walker owns one per listing.
#[derive(Debug, Default)]
pub struct HardlinkTracker {
    seen: HashMap<FileId, PathBuf>,
}

impl HardlinkTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path`, or return the earlier name of the same file.
    ///
    /// Entries whose identity is unknown are always treated as new.
    pub fn check_and_record(&mut self, path: &Path, metadata: &Metadata) -> Option<PathBuf> {
        let id = FileId::of(path, metadata)?;
        match self.seen.entry(id) {
            Entry::Occupied(first) => Some(first.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(path.to_path_buf());
                None
            }
        }
    }

    /// Number of distinct files recorded.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
