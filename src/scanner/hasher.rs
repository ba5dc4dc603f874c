//! BLAKE3 file hasher with bounded sampling and streaming support.
//!
//! # Overview
//!
//! Two digests are computed here:
//! - The **sample digest** covers at most `2 x sample_size` bytes (the head and
//!   the tail of the file) followed by the file size. Different sample digests
//!   prove two files differ.
//! - The **full digest** covers the whole byte stream, read in
//!   [`STREAM_CHUNK_SIZE`] chunks so memory use does not depend on file size.
//!
//! # Example
//!
//! ```no_run
//! use photodedup::scanner::{hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let sample = hasher.sample_digest(Path::new("a.jpg")).unwrap();
//! let full = hasher.full_digest(Path::new("a.jpg"), 4096).unwrap();
//! println!("{} / {}", hash_to_hex(&sample), hash_to_hex(&full));
//! ```

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::HashError;

/// A 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// Default number of bytes sampled from each end of a file.
pub const DEFAULT_SAMPLE_SIZE: u64 = 8192;

/// Chunk size used when streaming a file through the full digest.
pub const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Computes sample and full digests of files.
///
/// The hasher holds no per-file state and can be shared between threads
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Hasher {
    sample_size: u64,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default sample size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            shutdown_flag: None,
        }
    }

    /// Set the number of bytes sampled from each end of a file.
    ///
    /// A sample size of zero is raised to one byte.
    #[must_use]
    pub fn with_sample_size(mut self, sample_size: u64) -> Self {
        self.sample_size = sample_size.max(1);
        self
    }

    /// Set the shutdown flag checked between chunks of a full digest.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Bytes sampled from each end of a file.
    #[must_use]
    pub fn sample_size(&self) -> u64 {
        self.sample_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Compute the sample digest of a file.
    ///
    /// Files no larger than `2 x sample_size` are read once and digested
    /// whole. Larger files contribute their first and last `sample_size`
    /// bytes. The size is always appended as a little-endian `u64`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read, or if it
    /// shrinks while being read.
    pub fn sample_digest(&self, path: &Path) -> Result<Hash, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| HashError::from_io(path, e))?
            .len();

        let n = self.sample_size;
        let mut hasher = blake3::Hasher::new();

        if size <= n.saturating_mul(2) {
            let mut buf = vec![0u8; size as usize];
            read_exact_or_truncated(&mut file, &mut buf, path, size)?;
            hasher.update(&buf);
        } else {
            let mut buf = vec![0u8; n as usize];
            read_exact_or_truncated(&mut file, &mut buf, path, size)?;
            hasher.update(&buf);

            file.seek(SeekFrom::Start(size - n))
                .map_err(|e| HashError::from_io(path, e))?;
            read_exact_or_truncated(&mut file, &mut buf, path, size)?;
            hasher.update(&buf);
        }

        hasher.update(&size.to_le_bytes());
        Ok(*hasher.finalize().as_bytes())
    }

    /// Compute the digest of the complete file content.
    ///
    /// `expected_size` is the size recorded at scan time. A file whose
    /// streamed length differs from it is rejected.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be read,
    /// [`HashError::Truncated`] if its length no longer matches
    /// `expected_size`, or [`HashError::Interrupted`] if shutdown was
    /// requested mid-file.
    pub fn full_digest(&self, path: &Path, expected_size: u64) -> Result<Hash, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut hasher = blake3::Hasher::new();
        let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
        let mut total: u64 = 0;
        let changed = || HashError::Truncated {
            path: path.to_path_buf(),
            expected: expected_size,
        };

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            let read = match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            total += read as u64;
            if total > expected_size {
                log::debug!("{} grew past {} bytes", path.display(), expected_size);
                return Err(changed());
            }
            hasher.update(&buf[..read]);
        }

        if total != expected_size {
            log::debug!(
                "{} shrank from {} to {} bytes",
                path.display(),
                expected_size,
                total
            );
            return Err(changed());
        }

        Ok(*hasher.finalize().as_bytes())
    }
}

fn read_exact_or_truncated(
    file: &mut File,
    buf: &mut [u8],
    path: &Path,
    expected: u64,
) -> Result<(), HashError> {
    file.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => HashError::Truncated {
            path: path.to_path_buf(),
            expected,
        },
        _ => HashError::from_io(path, e),
    })
}

/// Format a digest as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}
