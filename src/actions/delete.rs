//! Removal of redundant copies.
//!
//! # Overview
//!
//! [`apply`] carries out [`RemovalPlan`]s produced by the retention policy:
//! - Permanent deletion (default) or move to system trash
//! - Best-effort: every file is attempted, failures are collected per path
//! - The retained file of a plan is never deleted, and its siblings are kept
//!   when it has changed or vanished since the scan
//! - TOCTOU verification against the scan snapshot before deletion
//! - Optional byte-by-byte comparison with the retained copy
//! - Dry-run mode that only reports what would happen
//! - Stops between files when shutdown is requested
//!
//! # Example
//!
//! ```no_run
//! use photodedup::actions::delete::{apply, DeleteConfig, NoopDeleteCallback};
//! use photodedup::duplicates::{resolve, DuplicateFinder, RetentionPolicy};
//! use std::path::Path;
//!
//! let (groups, _) = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("./photos"))
//!     .unwrap();
//! let plans = resolve(&groups, RetentionPolicy::KeepOldest);
//!
//! let outcome = apply::<NoopDeleteCallback>(&plans, &DeleteConfig::default(), None);
//! println!("{}", outcome.summary());
//! ```

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use bytesize::ByteSize;
use thiserror::Error;

use crate::duplicates::RemovalPlan;
use crate::scanner::{FileRecord, STREAM_CHUNK_SIZE};

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File was modified since scan (TOCTOU protection).
    #[error("file modified since scan: {0}")]
    Modified(PathBuf),

    /// The path is the retained copy of its group, or resolves to it.
    #[error("refusing to delete retained copy: {0}")]
    WouldDeleteRetained(PathBuf),

    /// The retained copy changed or disappeared since the scan.
    #[error("retained copy {retained} changed since scan, keeping {path}")]
    RetainedChanged {
        /// Copy that was going to be deleted
        path: PathBuf,
        /// The retained copy that failed verification
        retained: PathBuf,
    },

    /// Byte comparison with the retained copy found a difference.
    #[error("content differs from retained copy {retained}: {path}")]
    ContentMismatch {
        /// File that was going to be deleted
        path: PathBuf,
        /// The retained copy it was compared with
        retained: PathBuf,
    },

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed {
        /// File that could not be trashed
        path: PathBuf,
        /// Message from the platform trash implementation
        message: String,
    },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {source}")]
    PermanentDeleteFailed {
        /// File that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified(p)
            | Self::WouldDeleteRetained(p)
            | Self::RetainedChanged { path: p, .. }
            | Self::ContentMismatch { path: p, .. }
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Result of a successful deletion operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

impl DeleteResult {
    /// Create a new delete result.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, permanent: bool) -> Self {
        Self {
            path,
            size,
            permanent,
        }
    }
}

/// Outcome of applying removal plans.
#[derive(Debug, Default)]
pub struct RemovalOutcome {
    /// Files removed (or, in dry-run mode, that would be removed).
    pub removed: Vec<DeleteResult>,
    /// Files that could not be removed, with the reason.
    pub failures: Vec<(PathBuf, DeleteError)>,
    /// Total bytes freed.
    pub bytes_freed: u64,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Whether shutdown stopped the pass before every file was attempted.
    pub interrupted: bool,
}

impl RemovalOutcome {
    /// Number of successful removals.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.removed.len()
    }

    /// Number of failed removals.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all removals succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether `path` was removed (or, in dry-run mode, would be).
    #[must_use]
    pub fn was_removed(&self, path: &Path) -> bool {
        self.removed.iter().any(|r| r.path == path)
    }

    /// Paths of the removed files.
    #[must_use]
    pub fn removed_paths(&self) -> Vec<&Path> {
        self.removed.iter().map(|r| r.path.as_path()).collect()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = if self.dry_run {
            "Would delete"
        } else {
            "Deleted"
        };
        let line = if self.all_succeeded() {
            format!(
                "{} {} file(s), {} freed",
                verb,
                self.success_count(),
                ByteSize::b(self.bytes_freed)
            )
        } else {
            format!(
                "{} {} file(s), {} failed, {} freed",
                verb,
                self.success_count(),
                self.failure_count(),
                ByteSize::b(self.bytes_freed)
            )
        };
        if self.interrupted {
            format!("{line} (interrupted)")
        } else {
            line
        }
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone)]
pub struct DeleteConfig {
    /// Move files to the system trash instead of deleting permanently.
    pub trash: bool,
    /// Re-check size and mtime against the scan snapshot before deletion.
    pub verify_unchanged: bool,
    /// Compare bytes with the retained copy before deletion.
    pub paranoid: bool,
    /// Report what would be deleted without touching the disk.
    pub dry_run: bool,
    /// Shutdown flag checked before each file.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            trash: false,
            verify_unchanged: true,
            paranoid: false,
            dry_run: false,
            shutdown_flag: None,
        }
    }
}

impl DeleteConfig {
    /// Create config for permanent deletion.
    #[must_use]
    pub fn permanent() -> Self {
        Self::default()
    }

    /// Create config for trash deletion.
    #[must_use]
    pub fn trash() -> Self {
        Self {
            trash: true,
            ..Self::default()
        }
    }

    /// Enable/disable moving files to trash.
    #[must_use]
    pub fn with_trash(mut self, trash: bool) -> Self {
        self.trash = trash;
        self
    }

    /// Enable/disable TOCTOU verification.
    #[must_use]
    pub fn with_verify_unchanged(mut self, verify: bool) -> Self {
        self.verify_unchanged = verify;
        self
    }

    /// Enable/disable byte comparison with the retained copy.
    #[must_use]
    pub fn with_paranoid(mut self, paranoid: bool) -> Self {
        self.paranoid = paranoid;
        self
    }

    /// Enable/disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Callback trait for deletion progress reporting.
pub trait DeleteProgressCallback: Send + Sync {
    /// Called before each file deletion.
    fn on_before_delete(&self, path: &Path, index: usize, total: usize);

    /// Called after successful deletion.
    fn on_delete_success(&self, path: &Path, size: u64);

    /// Called after failed deletion.
    fn on_delete_failure(&self, path: &Path, error: &DeleteError);

    /// Called when all plans have been processed.
    fn on_complete(&self, outcome: &RemovalOutcome);
}

/// Callback that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDeleteCallback;

impl DeleteProgressCallback for NoopDeleteCallback {
    fn on_before_delete(&self, _: &Path, _: usize, _: usize) {}
    fn on_delete_success(&self, _: &Path, _: u64) {}
    fn on_delete_failure(&self, _: &Path, _: &DeleteError) {}
    fn on_complete(&self, _: &RemovalOutcome) {}
}

/// File metadata snapshot for TOCTOU verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    /// Path to the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: Option<SystemTime>,
}

impl FileSnapshot {
    /// Create a snapshot of a file's current state.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or can't be accessed.
    pub fn capture(path: &Path) -> Result<Self, DeleteError> {
        let metadata = fs::metadata(path).map_err(|e| DeleteError::from_io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            mtime: metadata.modified().ok(),
        })
    }

    /// Snapshot as recorded by the scan.
    #[must_use]
    pub fn from_record(record: &FileRecord) -> Self {
        Self {
            path: record.path.clone(),
            size: record.size,
            mtime: Some(record.modified),
        }
    }

    /// Verify that the file still matches this snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if file was modified, deleted, or can't be accessed.
    pub fn verify(&self) -> Result<(), DeleteError> {
        let current = Self::capture(&self.path)?;

        if let (Some(orig), Some(curr)) = (self.mtime, current.mtime) {
            if orig != curr {
                log::warn!(
                    "File modified since scan: {} (mtime changed)",
                    self.path.display()
                );
                return Err(DeleteError::Modified(self.path.clone()));
            }
        }

        if self.size != current.size {
            log::warn!(
                "File modified since scan: {} (size changed from {} to {})",
                self.path.display(),
                self.size,
                current.size
            );
            return Err(DeleteError::Modified(self.path.clone()));
        }

        Ok(())
    }
}

/// Whether two paths name the same file, directly or through symlinks.
fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}

/// Compare two files byte by byte.
///
/// # Errors
///
/// Returns [`DeleteError`] if either file cannot be read.
pub fn contents_equal(a: &Path, b: &Path) -> Result<bool, DeleteError> {
    let mut fa = File::open(a).map_err(|e| DeleteError::from_io(a, e))?;
    let mut fb = File::open(b).map_err(|e| DeleteError::from_io(b, e))?;

    let len_a = fa.metadata().map_err(|e| DeleteError::from_io(a, e))?.len();
    let len_b = fb.metadata().map_err(|e| DeleteError::from_io(b, e))?.len();
    if len_a != len_b {
        return Ok(false);
    }

    let mut buf_a = vec![0u8; STREAM_CHUNK_SIZE];
    let mut buf_b = vec![0u8; STREAM_CHUNK_SIZE];
    loop {
        let n = read_full(&mut fa, &mut buf_a).map_err(|e| DeleteError::from_io(a, e))?;
        let m = read_full(&mut fb, &mut buf_b).map_err(|e| DeleteError::from_io(b, e))?;
        if n != m || buf_a[..n] != buf_b[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as the file allows; returns bytes read.
fn read_full(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Move a single file to the system trash.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if the file can't be accessed
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult::new(path.to_path_buf(), size, false))
}

/// Permanently delete a single file.
///
/// **WARNING**: This operation cannot be undone.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if the file can't be accessed
/// - `PermanentDeleteFailed` if the delete operation fails
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| {
        log::error!("Permanent delete failed for {}: {}", path.display(), e);
        DeleteError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult::new(path.to_path_buf(), size, true))
}

/// Check that the retained copy of a plan is still the file that was scanned.
///
/// With `verify_unchanged` off only its existence is checked.
fn check_retained(keep: &FileRecord, config: &DeleteConfig) -> Result<(), DeleteError> {
    if config.verify_unchanged {
        FileSnapshot::from_record(keep).verify()
    } else {
        fs::metadata(&keep.path)
            .map(|_| ())
            .map_err(|e| DeleteError::from_io(&keep.path, e))
    }
}

/// Remove one redundant copy, after every check the config asks for.
///
/// # Errors
///
/// - `WouldDeleteRetained` if `record` is, or resolves to, the retained file
/// - `Modified` if the file changed since the scan
/// - `ContentMismatch` if paranoid comparison finds a difference
/// - Any error from the deletion itself
pub fn remove_copy(
    record: &FileRecord,
    keep: &FileRecord,
    config: &DeleteConfig,
) -> Result<DeleteResult, DeleteError> {
    if is_same_file(&record.path, &keep.path) {
        log::error!(
            "Refusing to delete {}: it is the retained copy",
            record.path.display()
        );
        return Err(DeleteError::WouldDeleteRetained(record.path.clone()));
    }

    if config.dry_run {
        log::info!("Would delete: {} ({} bytes)", record.path.display(), record.size);
        return Ok(DeleteResult::new(
            record.path.clone(),
            record.size,
            !config.trash,
        ));
    }

    if config.verify_unchanged {
        FileSnapshot::from_record(record).verify()?;
    }

    if config.paranoid && !contents_equal(&record.path, &keep.path)? {
        log::warn!(
            "Content mismatch between {} and {}",
            record.path.display(),
            keep.path.display()
        );
        return Err(DeleteError::ContentMismatch {
            path: record.path.clone(),
            retained: keep.path.clone(),
        });
    }

    if config.trash {
        delete_to_trash(&record.path)
    } else {
        permanent_delete(&record.path)
    }
}

/// Apply removal plans, best-effort.
///
/// Every redundant copy is attempted on its own. A failure is recorded in
/// [`RemovalOutcome::failures`] and never stops the remaining files. The
/// operation is not atomic: an outcome can mix removed and failed files.
///
/// Before touching a plan's copies the retained file is checked against the
/// scan. If it changed or vanished, every copy of that plan fails with
/// [`DeleteError::RetainedChanged`] and stays on disk.
///
/// A shutdown request stops the pass before the next file and sets
/// [`RemovalOutcome::interrupted`].
///
/// # Example
///
/// ```
/// use photodedup::actions::delete::{apply, DeleteConfig, NoopDeleteCallback};
///
/// let outcome = apply::<NoopDeleteCallback>(&[], &DeleteConfig::default(), None);
/// assert!(outcome.all_succeeded());
/// assert_eq!(outcome.bytes_freed, 0);
/// ```
pub fn apply<C: DeleteProgressCallback>(
    plans: &[RemovalPlan],
    config: &DeleteConfig,
    callback: Option<&C>,
) -> RemovalOutcome {
    let mut outcome = RemovalOutcome {
        dry_run: config.dry_run,
        ..Default::default()
    };
    let total: usize = plans.iter().map(|p| p.remove.len()).sum();
    let mut index = 0;

    'plans: for plan in plans {
        let retained = if config.dry_run {
            Ok(())
        } else {
            check_retained(&plan.keep, config)
        };
        if let Err(ref e) = retained {
            log::warn!(
                "Retained copy {} failed verification ({}); keeping its {} duplicate(s)",
                plan.keep.path.display(),
                e,
                plan.remove.len()
            );
        }

        for record in &plan.remove {
            if config.is_shutdown_requested() {
                log::info!("Removal interrupted by shutdown signal");
                outcome.interrupted = true;
                break 'plans;
            }

            if let Some(cb) = callback {
                cb.on_before_delete(&record.path, index, total);
            }
            index += 1;

            let result = if retained.is_ok() {
                remove_copy(record, &plan.keep, config)
            } else {
                Err(DeleteError::RetainedChanged {
                    path: record.path.clone(),
                    retained: plan.keep.path.clone(),
                })
            };

            match result {
                Ok(result) => {
                    outcome.bytes_freed += result.size;
                    if let Some(cb) = callback {
                        cb.on_delete_success(&result.path, result.size);
                    }
                    outcome.removed.push(result);
                }
                Err(e) => {
                    log::warn!("Failed to delete {}: {}", record.path.display(), e);
                    if let Some(cb) = callback {
                        cb.on_delete_failure(&record.path, &e);
                    }
                    outcome.failures.push((record.path.clone(), e));
                }
            }
        }
    }

    if let Some(cb) = callback {
        cb.on_complete(&outcome);
    }

    log::info!("{}", outcome.summary());

    outcome
}
