//! Directory walker producing the file inventory.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for listing the direct entries
//! of one directory and collecting file metadata for duplicate detection.
//! It uses [`jwalk`] limited to depth 1, with entries sorted by file name so
//! the scan order is the same on every run.
//!
//! # Behavior
//!
//! - Only regular files are returned. Symlinks are followed to their target.
//! - Directories, special files and broken symlinks are skipped silently.
//! - A hard link or symlink to a file already listed is skipped; the first
//!   name in listing order stands for the file.
//! - Files below the configured minimum size are skipped.
//! - Per-entry I/O failures are logged and yielded as [`ScanError`] values;
//!   they never end the walk.
//!
//! # Example
//!
//! ```no_run
//! use photodedup::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Pictures"), WalkerConfig::new(1024));
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use jwalk::WalkDir;

use super::hardlink::HardlinkTracker;
use super::{FileRecord, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Directory walker for file discovery.
pub struct Walker {
    /// Directory to list
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given directory.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback, notified once per accepted file.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Check that the root exists and is a directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] or [`ScanError::NotADirectory`].
    pub fn validate_root(&self) -> Result<(), ScanError> {
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ScanError::NotADirectory(self.root.clone())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ScanError::NotFound(self.root.clone()))
            }
            Err(e) => Err(self.io_error(&self.root, e)),
        }
    }

    /// Walk the directory, yielding file records in file-name order.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. The root itself is not validated here; see
    /// [`Walker::validate_root`] or [`scan`].
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let walk_dir = WalkDir::new(&self.root)
            .max_depth(1)
            .skip_hidden(false)
            .follow_links(false)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        let mut accepted = 0usize;
        let mut identities = HardlinkTracker::new();

        walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            match entry_result {
                Ok(entry) => {
                    if entry.depth == 0 {
                        return None;
                    }
                    let path = entry.path();
                    let file_type = entry.file_type();

                    if file_type.is_dir() {
                        log::trace!("Skipping directory: {}", path.display());
                        return None;
                    }

                    let metadata = match std::fs::metadata(&path) {
                        Ok(m) => m,
                        Err(e) if file_type.is_symlink()
                            && e.kind() == std::io::ErrorKind::NotFound =>
                        {
                            log::trace!("Skipping broken symlink: {}", path.display());
                            return None;
                        }
                        Err(e) => return Some(Err(self.io_error(&path, e))),
                    };

                    let record = self.process_file_entry(path, &metadata)?;
                    if let Some(first) = identities.check_and_record(&record.path, &metadata) {
                        log::debug!(
                            "Skipping {}: same file as {}",
                            record.path.display(),
                            first.display()
                        );
                        return None;
                    }
                    accepted += 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback.on_progress(accepted, record.path.to_string_lossy().as_ref());
                    }
                    Some(Ok(record))
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    Some(Err(ScanError::Io {
                        path,
                        source: Arc::new(std::io::Error::other(e.to_string())),
                    }))
                }
            }
        })
    }

    /// Build a record for a regular file that passes the size filter.
    fn process_file_entry(&self, path: PathBuf, metadata: &Metadata) -> Option<FileRecord> {
        if !metadata.is_file() {
            log::trace!("Skipping non-regular file: {}", path.display());
            return None;
        }

        let size = metadata.len();
        if size < self.config.min_size {
            log::trace!(
                "Skipping file below minimum size ({} < {}): {}",
                size,
                self.config.min_size,
                path.display()
            );
            return None;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Some(FileRecord::new(path, size, modified))
    }

    /// Classify and log an I/O error for a single entry.
    fn io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path.to_path_buf())
            }
            ErrorKind::NotFound => {
                log::warn!("File not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path.to_path_buf())
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                ScanError::Io {
                    path: path.to_path_buf(),
                    source: Arc::new(error),
                }
            }
        }
    }
}

/// The files found in one directory, plus the entries that could not be read.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    /// Regular files at or above the minimum size, in scan order
    pub records: Vec<FileRecord>,
    /// Per-entry failures; the scan continued past each of them
    pub errors: Vec<ScanError>,
}

impl Inventory {
    /// Total bytes across all records.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }
}

/// List the regular files directly inside `folder` that are at least
/// `min_size` bytes.
///
/// # Errors
///
/// Returns [`ScanError::NotFound`] if `folder` does not exist and
/// [`ScanError::NotADirectory`] if it is not a directory. Errors on
/// individual entries are collected in [`Inventory::errors`] instead.
pub fn scan(folder: &Path, min_size: u64) -> Result<Inventory, ScanError> {
    let walker = Walker::new(folder, WalkerConfig::new(min_size));
    walker.validate_root()?;
    Ok(collect(&walker))
}

/// Drain a walker into an inventory.
pub(crate) fn collect(walker: &Walker) -> Inventory {
    let mut inventory = Inventory::default();
    for result in walker.walk() {
        match result {
            Ok(record) => inventory.records.push(record),
            Err(e) => inventory.errors.push(e),
        }
    }
    inventory
}
