//! Scanner module for file inventory and content digesting.
//!
//! This module provides functionality for:
//! - Listing the regular files of a single directory (non-recursive)
//! - Bounded sample digests (prefix + suffix + size) with BLAKE3
//! - Streaming full-content digests with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory listing and file inventory
//! - [`hardlink`]: Recognition of second names for one file
//! - [`hasher`]: BLAKE3 sample and full digests (streaming)
//!
//! # Example
//!
//! ```no_run
//! use photodedup::scanner::{scan, DEFAULT_MIN_SIZE};
//! use std::path::Path;
//!
//! let inventory = scan(Path::new("./photos"), DEFAULT_MIN_SIZE).unwrap();
//! for record in &inventory.records {
//!     println!("{}: {} bytes", record.path.display(), record.size);
//! }
//! for err in &inventory.errors {
//!     eprintln!("Warning: {}", err);
//! }
//! ```

pub mod hardlink;
pub mod hasher;
pub mod walker;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;

// Re-export main types
pub use hardlink::{FileId, HardlinkTracker};
pub use hasher::{hash_to_hex, Hash, Hasher, DEFAULT_SAMPLE_SIZE, STREAM_CHUNK_SIZE};
pub use walker::{scan, Inventory, Walker};

/// Files below this size are ignored unless configured otherwise.
///
/// Icons, thumbnails and metadata sidecars produce a lot of duplicate noise
/// for very little reclaimable storage.
pub const DEFAULT_MIN_SIZE: u64 = 1024;

/// Metadata snapshot of a discovered file.
///
/// Taken once at scan time. Later stages tolerate the file changing or
/// disappearing underneath them and report that as a per-file error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

impl FileRecord {
    /// Create a new FileRecord.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            modified,
        }
    }
}

/// Configuration for the directory walker.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Minimum file size to include (in bytes).
    pub min_size: u64,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
        }
    }
}

impl WalkerConfig {
    /// Create a new configuration with the given minimum size.
    #[must_use]
    pub fn new(min_size: u64) -> Self {
        Self { min_size }
    }
}

/// Errors that can occur while listing a directory.
///
/// `NotFound` and `NotADirectory` describe the scan root and abort the scan.
/// The other variants describe a single entry and are collected instead.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A digest could not be computed for a file.
    #[error(transparent)]
    HashError(#[from] HashError),
}

impl ScanError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::NotADirectory(p) => p,
            Self::Io { path, .. } => path,
            Self::HashError(e) => e.path(),
        }
    }
}

impl Serialize for ScanError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("ScanError", 2)?;
        s.serialize_field("path", &self.path().to_string_lossy())?;
        s.serialize_field("error", &self.to_string())?;
        s.end()
    }
}

/// Errors that can occur while digesting a file.
#[derive(thiserror::Error, Debug, Clone)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The file length no longer matches the size recorded when it was scanned.
    #[error("File size changed since scan: {path} (expected {expected} bytes)")]
    Truncated {
        /// Path of the resized file
        path: PathBuf,
        /// Size recorded at scan time
        expected: u64,
    },

    /// Digesting was stopped by a shutdown request.
    #[error("Digest interrupted: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl HashError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            ErrorKind::UnexpectedEof => Self::Truncated {
                path: path.to_path_buf(),
                expected: 0,
            },
            _ => Self::Io {
                path: path.to_path_buf(),
                source: Arc::new(error),
            },
        }
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Interrupted(p) => p,
            Self::Truncated { path, .. } | Self::Io { path, .. } => path,
        }
    }

    /// Whether this error was caused by cancellation rather than the file.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted(_))
    }
}
