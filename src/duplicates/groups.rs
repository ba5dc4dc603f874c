//! Size bucketing and duplicate group types.
//!
//! # Overview
//!
//! Size bucketing is the first and cheapest filter of duplicate detection:
//! files with different sizes cannot be duplicates, and most photos in a
//! typical folder have a size nobody else shares.
//!
//! # Example
//!
//! ```
//! use photodedup::scanner::FileRecord;
//! use photodedup::duplicates::group_by_size;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/a.jpg"), 1024, SystemTime::now()),
//!     FileRecord::new(PathBuf::from("/b.jpg"), 1024, SystemTime::now()),
//!     FileRecord::new(PathBuf::from("/c.jpg"), 2048, SystemTime::now()),
//! ];
//!
//! let (buckets, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(buckets.len(), 1);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash as StdHash;
use std::path::PathBuf;

use crate::scanner::{hash_to_hex, FileRecord, Hash};

/// Confirmed group of byte-identical files.
///
/// Members are kept in scan order and there are always at least two of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// BLAKE3 digest of the shared content
    pub digest: Hash,
    /// File size in bytes, shared by every member
    pub size: u64,
    /// Members of the group, in scan order
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(digest: Hash, size: u64, files: Vec<FileRecord>) -> Self {
        debug_assert!(files.iter().all(|f| f.size == size));
        Self {
            digest,
            size,
            files,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Bytes freed by keeping exactly one copy: `size x (len - 1)`.
    #[must_use]
    pub fn reclaimable_bytes(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of redundant copies (total - 1 retained).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hash_to_hex(&self.digest)
    }

    /// Paths of the files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Statistics from the size bucketing phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of distinct file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in buckets of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as the only file of their size
    pub eliminated_unique: usize,
    /// Number of size buckets with 2+ files
    pub duplicate_buckets: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size bucketing.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by exact size and drop sizes seen only once.
///
/// Single pass, no file I/O. Within a bucket, files keep the order in which
/// they were supplied. Buckets are ordered by size.
///
/// # Example
///
/// ```
/// use photodedup::scanner::FileRecord;
/// use photodedup::duplicates::group_by_size;
/// use std::path::PathBuf;
/// use std::time::SystemTime;
///
/// let files = vec![
///     FileRecord::new(PathBuf::from("/a.jpg"), 100, SystemTime::now()),
///     FileRecord::new(PathBuf::from("/b.jpg"), 100, SystemTime::now()),
///     FileRecord::new(PathBuf::from("/c.jpg"), 200, SystemTime::now()),
/// ];
///
/// let (buckets, stats) = group_by_size(files);
/// assert_eq!(buckets[&100].len(), 2);
/// assert!(!buckets.contains_key(&200));
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileRecord>,
) -> (BTreeMap<u64, Vec<FileRecord>>, GroupingStats) {
    let mut all_buckets: BTreeMap<u64, Vec<FileRecord>> = BTreeMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;
        all_buckets.entry(file.size).or_default().push(file);
    }

    stats.unique_sizes = all_buckets.len();

    all_buckets.retain(|size, files| {
        if files.len() == 1 {
            stats.eliminated_unique += 1;
            log::trace!(
                "Eliminated unique size {}: {}",
                size,
                files[0].path.display()
            );
            false
        } else {
            stats.potential_duplicates += files.len();
            stats.duplicate_buckets += 1;
            log::debug!("Size bucket {} bytes: {} candidates", size, files.len());
            true
        }
    });

    log::info!(
        "Size bucketing complete: {} files → {} candidates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (all_buckets, stats)
}

/// Partition keyed items, preserving first-seen order.
///
/// Groups come out in the order their first member was seen and each group
/// keeps its members in input order, so the result does not depend on hash
/// map iteration order.
pub(crate) fn partition_in_order<K, T>(items: impl IntoIterator<Item = (K, T)>) -> Vec<(K, Vec<T>)>
where
    K: StdHash + Eq + Clone,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();

    for (key, item) in items {
        match index.get(&key) {
            Some(&i) => groups[i].1.push(item),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![item]));
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn make_file(path: &str, size: u64) -> FileRecord {
        FileRecord::new(PathBuf::from(path), size, SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn test_duplicate_group_reclaimable_bytes() {
        let group = DuplicateGroup::new(
            [0u8; 32],
            1000,
            vec![
                make_file("/a.jpg", 1000),
                make_file("/b.jpg", 1000),
                make_file("/c.jpg", 1000),
            ],
        );

        assert_eq!(group.reclaimable_bytes(), 2000);
        assert_eq!(group.duplicate_count(), 2);
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn test_duplicate_group_paths_in_order() {
        let group = DuplicateGroup::new(
            [1u8; 32],
            10,
            vec![make_file("/b.jpg", 10), make_file("/a.jpg", 10)],
        );
        assert_eq!(
            group.paths(),
            vec![PathBuf::from("/b.jpg"), PathBuf::from("/a.jpg")]
        );
    }

    #[test]
    fn test_group_by_size_empty_input() {
        let (buckets, stats) = group_by_size(Vec::new());

        assert!(buckets.is_empty());
        assert_eq!(stats, GroupingStats::default());
    }

    #[test]
    fn test_group_by_size_all_unique() {
        let files = vec![
            make_file("/a.jpg", 100),
            make_file("/b.jpg", 200),
            make_file("/c.jpg", 300),
        ];
        let (buckets, stats) = group_by_size(files);

        assert!(buckets.is_empty());
        assert_eq!(stats.unique_sizes, 3);
        assert_eq!(stats.eliminated_unique, 3);
        assert_eq!(stats.potential_duplicates, 0);
    }

    #[test]
    fn test_group_by_size_multiple_buckets() {
        let files = vec![
            make_file("/a1.jpg", 100),
            make_file("/b1.jpg", 200),
            make_file("/a2.jpg", 100),
            make_file("/b2.jpg", 200),
            make_file("/b3.jpg", 200),
            make_file("/c.jpg", 300),
        ];
        let (buckets, stats) = group_by_size(files);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[&100].len(), 2);
        assert_eq!(buckets[&200].len(), 3);
        assert_eq!(stats.total_size, 1000);
        assert_eq!(stats.eliminated_unique, 1);
        assert_eq!(stats.potential_duplicates, 5);
        assert_eq!(stats.duplicate_buckets, 2);
        assert!((stats.elimination_rate() - 16.66).abs() < 0.1);
    }

    #[test]
    fn test_group_by_size_preserves_input_order() {
        let files = vec![
            make_file("/z.jpg", 100),
            make_file("/a.jpg", 100),
            make_file("/m.jpg", 100),
        ];
        let (buckets, _) = group_by_size(files);

        let names: Vec<_> = buckets[&100].iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("/z.jpg"),
                PathBuf::from("/a.jpg"),
                PathBuf::from("/m.jpg")
            ]
        );
    }

    #[test]
    fn test_partition_in_order() {
        let groups = partition_in_order(vec![("b", 1), ("a", 2), ("b", 3), ("c", 4), ("a", 5)]);

        assert_eq!(
            groups,
            vec![("b", vec![1, 3]), ("a", vec![2, 5]), ("c", vec![4])]
        );
    }

    #[test]
    fn test_large_file_count_performance() {
        use std::time::Instant;

        let files: Vec<FileRecord> = (0..100_000)
            .map(|i| {
                let size = if i % 2 == 0 { i as u64 } else { (i / 100) as u64 };
                make_file(&format!("/file{i}.jpg"), size)
            })
            .collect();

        let start = Instant::now();
        let (buckets, stats) = group_by_size(files);

        assert_eq!(stats.total_files, 100_000);
        assert!(!buckets.is_empty());
        assert!(start.elapsed().as_secs() < 2);
    }
}
