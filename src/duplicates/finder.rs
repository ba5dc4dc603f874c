//! Duplicate finder implementation with multi-phase detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Inventory**: list the regular files of one directory
//! 2. **Size bucketing**: group files by exact size (see [`crate::duplicates::groups`])
//! 3. **Sample digest**: digest head, tail and size of same-size files
//! 4. **Full digest**: digest the entire content of sample matches
//!
//! Each phase only receives the survivors of the previous one and completes
//! for all candidates before the next one starts.
//!
//! # Example
//!
//! ```no_run
//! use photodedup::scanner::{scan, Hasher};
//! use photodedup::duplicates::{confirm_groups, filter_by_sample, group_by_size, FinderConfig};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let inventory = scan(Path::new("./photos"), 1024).unwrap();
//! let (buckets, _) = group_by_size(inventory.records);
//!
//! let config = FinderConfig::default();
//! let hasher = Arc::new(Hasher::new());
//! let (candidates, sample_stats) = filter_by_sample(buckets, &hasher, &config);
//! let (groups, _) = confirm_groups(candidates, &hasher, &config);
//!
//! println!("{} sample candidates, {} groups", sample_stats.potential_duplicates, groups.len());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::groups::{group_by_size, partition_in_order, DuplicateGroup};
use crate::progress::{ProgressCallback, PHASE_FULL, PHASE_SAMPLE, PHASE_WALKING};
use crate::scanner::{
    hash_to_hex, walker, FileRecord, Hash, HashError, Hasher, ScanError, Walker, WalkerConfig,
    DEFAULT_MIN_SIZE, DEFAULT_SAMPLE_SIZE,
};

/// Default number of concurrent digest workers.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Configuration for the duplicate finder and its digest phases.
#[derive(Clone)]
pub struct FinderConfig {
    /// Minimum file size to consider (in bytes)
    pub min_size: u64,
    /// Whether to run the sample digest phase before full digests
    pub use_sample_hash: bool,
    /// Bytes sampled from each end of a file
    pub sample_size: u64,
    /// Number of I/O threads for digesting
    pub io_threads: usize,
    /// Shutdown flag for graceful termination
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Progress callback
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("min_size", &self.min_size)
            .field("use_sample_hash", &self.use_sample_hash)
            .field("sample_size", &self.sample_size)
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            use_sample_hash: true,
            sample_size: DEFAULT_SAMPLE_SIZE,
            io_threads: DEFAULT_IO_THREADS,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Enable or disable the sample digest phase.
    #[must_use]
    pub fn with_sample_hash(mut self, enabled: bool) -> Self {
        self.use_sample_hash = enabled;
        self
    }

    /// Set the number of bytes sampled from each end of a file.
    #[must_use]
    pub fn with_sample_size(mut self, sample_size: u64) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Set the number of I/O threads.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
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
}

/// Files that survived a filter phase and may still be duplicates.
///
/// All members share the same size and, after the sample phase, the same
/// sample digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateGroup {
    /// Size shared by every member
    pub size: u64,
    /// Members in scan order
    pub files: Vec<FileRecord>,
}

/// Statistics from one digest phase.
#[derive(Debug, Clone, Default)]
pub struct PhaseStats {
    /// Number of files that entered the phase
    pub input_files: usize,
    /// Number of files digested successfully
    pub hashed_files: usize,
    /// Number of files that could not be digested
    pub failed_files: usize,
    /// Number of groups with 2+ members leaving the phase
    pub groups: usize,
    /// Number of files in those groups
    pub potential_duplicates: usize,
    /// Number of digested files whose digest nobody else shared
    pub eliminated: usize,
    /// Bytes read from disk during the phase
    pub bytes_read: u64,
    /// Whether the phase stopped early on a shutdown request
    pub interrupted: bool,
    /// Per-file digest failures
    pub errors: Vec<HashError>,
}

impl PhaseStats {
    /// Percentage of input files eliminated by this phase.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.input_files == 0 {
            0.0
        } else {
            let eliminated = self.input_files - self.potential_duplicates;
            (eliminated as f64 / self.input_files as f64) * 100.0
        }
    }
}

/// Run `op` inside a pool of `io_threads` workers.
///
/// Falls back to the global rayon pool if the bounded pool cannot be built.
fn run_bounded<T, F>(io_threads: usize, op: F) -> T
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    match rayon::ThreadPoolBuilder::new()
        .num_threads(io_threads.max(1))
        .build()
    {
        Ok(pool) => pool.install(op),
        Err(e) => {
            log::warn!(
                "Failed to create digest thread pool ({}), using global pool with {} threads",
                e,
                rayon::current_num_threads()
            );
            op()
        }
    }
}

/// Digest every member of every group in parallel.
///
/// Results come back in input order, tagged with the index of their group.
fn digest_all<F>(
    groups: Vec<Vec<FileRecord>>,
    phase: &str,
    config: &FinderConfig,
    digest: F,
) -> Vec<(usize, FileRecord, Result<Hash, HashError>)>
where
    F: Fn(&FileRecord) -> Result<Hash, HashError> + Sync,
{
    let work: Vec<(usize, FileRecord)> = groups
        .into_iter()
        .enumerate()
        .flat_map(|(idx, files)| files.into_iter().map(move |f| (idx, f)))
        .collect();

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(phase, work.len());
    }

    let done = AtomicUsize::new(0);
    let results = run_bounded(config.io_threads, || {
        work.into_par_iter()
            .map(|(idx, file)| {
                if config.is_shutdown_requested() {
                    let err = HashError::Interrupted(file.path.clone());
                    return (idx, file, Err(err));
                }

                let result = digest(&file);
                if let Some(ref callback) = config.progress_callback {
                    let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                    callback.on_progress(current, file.path.to_string_lossy().as_ref());
                }
                (idx, file, result)
            })
            .collect()
    });

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(phase);
    }

    results
}

/// Group digest results by (input group, digest) and keep groups of 2+.
fn regroup(
    results: Vec<(usize, FileRecord, Result<Hash, HashError>)>,
    stats: &mut PhaseStats,
    phase: &str,
) -> Vec<(Hash, Vec<FileRecord>)> {
    let mut digested = Vec::with_capacity(results.len());

    for (idx, file, result) in results {
        match result {
            Ok(hash) => {
                stats.hashed_files += 1;
                digested.push(((idx, hash), file));
            }
            Err(e) if e.is_interrupted() => {
                stats.interrupted = true;
            }
            Err(e) => {
                log::warn!("Failed to {} digest {}: {}", phase, file.path.display(), e);
                stats.failed_files += 1;
                stats.errors.push(e);
            }
        }
    }

    partition_in_order(digested)
        .into_iter()
        .filter_map(|((_, hash), files)| {
            if files.len() < 2 {
                stats.eliminated += files.len();
                log::trace!(
                    "Eliminated unique {} digest {}: {}",
                    phase,
                    hash_to_hex(&hash),
                    files[0].path.display()
                );
                return None;
            }
            stats.groups += 1;
            stats.potential_duplicates += files.len();
            log::debug!(
                "{} digest group {}: {} files",
                phase,
                hash_to_hex(&hash),
                files.len()
            );
            Some((hash, files))
        })
        .collect()
}

/// Sample digest phase: split size buckets by sample digest.
///
/// With `use_sample_hash` disabled the size buckets become candidate groups
/// unchanged. A file that cannot be read is dropped with a warning and its
/// error is recorded in the returned stats; its siblings continue.
#[must_use]
pub fn filter_by_sample(
    buckets: BTreeMap<u64, Vec<FileRecord>>,
    hasher: &Arc<Hasher>,
    config: &FinderConfig,
) -> (Vec<CandidateGroup>, PhaseStats) {
    let input_files: usize = buckets.values().map(Vec::len).sum();
    let mut stats = PhaseStats {
        input_files,
        ..Default::default()
    };

    if !config.use_sample_hash {
        log::info!("Sample digest disabled, {} files pass through", input_files);
        let candidates: Vec<CandidateGroup> = buckets
            .into_iter()
            .map(|(size, files)| CandidateGroup { size, files })
            .collect();
        stats.groups = candidates.len();
        stats.potential_duplicates = input_files;
        return (candidates, stats);
    }

    if input_files == 0 {
        log::debug!("Sample phase: No files to process");
        return (Vec::new(), stats);
    }

    log::info!("Sample phase: Computing sample digests for {} files", input_files);

    let sample_bytes = hasher.sample_size().saturating_mul(2);
    let results = digest_all(
        buckets.into_values().collect(),
        PHASE_SAMPLE,
        config,
        |file| hasher.sample_digest(&file.path),
    );

    stats.bytes_read = results
        .iter()
        .filter(|(_, _, r)| r.is_ok())
        .map(|(_, f, _)| f.size.min(sample_bytes))
        .sum();

    let candidates: Vec<CandidateGroup> = regroup(results, &mut stats, "sample")
        .into_iter()
        .map(|(_, files)| CandidateGroup {
            size: files[0].size,
            files,
        })
        .collect();

    if stats.interrupted {
        log::info!("Sample phase: Interrupted by shutdown signal");
    }

    log::info!(
        "Sample phase complete: {} files → {} candidates ({:.1}% eliminated, {} read)",
        stats.input_files,
        stats.potential_duplicates,
        stats.elimination_rate(),
        ByteSize::b(stats.bytes_read)
    );

    (candidates, stats)
}

/// Full digest phase: confirm candidate groups by whole-content digest.
///
/// Only digests shared by 2+ members of the same candidate group produce a
/// [`DuplicateGroup`]. A file that cannot be read is dropped on its own.
#[must_use]
pub fn confirm_groups(
    candidates: Vec<CandidateGroup>,
    hasher: &Arc<Hasher>,
    config: &FinderConfig,
) -> (Vec<DuplicateGroup>, PhaseStats) {
    let input_files: usize = candidates.iter().map(|c| c.files.len()).sum();
    let mut stats = PhaseStats {
        input_files,
        ..Default::default()
    };

    if input_files == 0 {
        log::debug!("Full phase: No files to process");
        return (Vec::new(), stats);
    }

    log::info!("Full phase: Computing full digests for {} files", input_files);

    let results = digest_all(
        candidates.into_iter().map(|c| c.files).collect(),
        PHASE_FULL,
        config,
        |file| hasher.full_digest(&file.path, file.size),
    );

    stats.bytes_read = results
        .iter()
        .filter(|(_, _, r)| r.is_ok())
        .map(|(_, f, _)| f.size)
        .sum();

    let groups: Vec<DuplicateGroup> = regroup(results, &mut stats, "full")
        .into_iter()
        .map(|(digest, files)| DuplicateGroup::new(digest, files[0].size, files))
        .collect();

    if stats.interrupted {
        log::info!("Full phase: Interrupted by shutdown signal");
    }

    log::info!(
        "Full phase complete: {} duplicate groups from {} candidates ({} read)",
        groups.len(),
        stats.input_files,
        ByteSize::b(stats.bytes_read)
    );

    (groups, stats)
}

/// Summary of a complete scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Total number of files in the inventory
    pub total_files: usize,
    /// Total size of all inventoried files in bytes
    pub total_size: u64,
    /// Number of files eliminated by size bucketing
    pub eliminated_by_size: usize,
    /// Number of files eliminated by the sample digest
    pub eliminated_by_sample: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Number of redundant copies (group members beyond the first)
    pub duplicate_files: usize,
    /// Bytes freed by keeping one copy per group
    pub reclaimable_space: u64,
    /// Bytes read by both digest phases
    pub bytes_read: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Per-file errors encountered during the scan
    pub scan_errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The scan root could not be read.
    #[error(transparent)]
    ScanError(#[from] ScanError),
}

/// Duplicate finder that orchestrates the multi-phase detection pipeline.
///
/// # Example
///
/// ```no_run
/// use photodedup::duplicates::{DuplicateFinder, FinderConfig};
/// use std::path::Path;
///
/// let config = FinderConfig::default().with_io_threads(4);
/// let finder = DuplicateFinder::new(config);
///
/// let (groups, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
///
/// println!("Found {} duplicate groups", groups.len());
/// println!("Reclaimable space: {}", summary.reclaimable_display());
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<Hasher>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new().with_sample_size(config.sample_size);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        Self {
            config,
            hasher: Arc::new(hasher),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration this finder runs with.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files directly inside the given directory.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist
    /// - The path is not a directory
    /// - The scan is interrupted by shutdown signal
    ///
    /// Unreadable files do not fail the scan; they are listed in
    /// [`ScanSummary::scan_errors`].
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();

        let mut walker = Walker::new(path, WalkerConfig::new(self.config.min_size));
        match walker.validate_root() {
            Ok(()) => {}
            Err(ScanError::NotFound(p)) => return Err(FinderError::PathNotFound(p)),
            Err(ScanError::NotADirectory(p)) => return Err(FinderError::NotADirectory(p)),
            Err(e) => return Err(FinderError::ScanError(e)),
        }

        log::info!("Starting duplicate scan of {}", path.display());

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_WALKING, 0);
            callback.on_message(&format!("Listing {}", path.display()));
            walker = walker.with_progress_callback(Arc::clone(callback));
        }

        let inventory = walker::collect(&walker);

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_WALKING);
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Found {} files ({} total)",
            inventory.records.len(),
            ByteSize::b(inventory.total_size())
        );

        let (groups, mut summary) = self.run_phases(inventory.records)?;
        let mut scan_errors = inventory.errors;
        scan_errors.append(&mut summary.scan_errors);
        summary.scan_errors = scan_errors;
        summary.scan_duration = start_time.elapsed();

        Ok((groups, summary))
    }

    /// Find duplicates among an already collected list of files.
    ///
    /// The files are treated as being in scan order; the minimum size filter
    /// is not applied again.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if shutdown is requested.
    pub fn find_duplicates_from_records(
        &self,
        records: Vec<FileRecord>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let (groups, mut summary) = self.run_phases(records)?;
        summary.scan_duration = start_time.elapsed();
        Ok((groups, summary))
    }

    fn run_phases(
        &self,
        records: Vec<FileRecord>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let mut summary = ScanSummary {
            total_files: records.len(),
            total_size: records.iter().map(|r| r.size).sum(),
            ..Default::default()
        };

        let scan_order: HashMap<PathBuf, usize> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.path.clone(), i))
            .collect();

        let (buckets, size_stats) = group_by_size(records);
        summary.eliminated_by_size = size_stats.eliminated_unique;

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if buckets.is_empty() {
            log::info!("No potential duplicates found after size bucketing");
            return Ok((Vec::new(), summary));
        }

        let (candidates, sample_stats) = filter_by_sample(buckets, &self.hasher, &self.config);
        summary.eliminated_by_sample = sample_stats.eliminated;
        summary.bytes_read += sample_stats.bytes_read;
        summary
            .scan_errors
            .extend(sample_stats.errors.into_iter().map(ScanError::from));

        if sample_stats.interrupted || self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if candidates.is_empty() {
            log::info!("No potential duplicates found after sample digest");
            return Ok((Vec::new(), summary));
        }

        let (mut groups, full_stats) = confirm_groups(candidates, &self.hasher, &self.config);
        summary.bytes_read += full_stats.bytes_read;
        summary
            .scan_errors
            .extend(full_stats.errors.into_iter().map(ScanError::from));

        if full_stats.interrupted || self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        // Emit groups in the order their earliest member was scanned
        groups.sort_by_key(|g| {
            g.files
                .first()
                .and_then(|f| scan_order.get(&f.path))
                .copied()
                .unwrap_or(usize::MAX)
        });

        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::reclaimable_bytes).sum();

        log::info!(
            "Scan complete: {} duplicate groups, {} redundant files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok((groups, summary))
    }
}
