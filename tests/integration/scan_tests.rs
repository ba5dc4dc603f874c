use photodedup::duplicates::{DuplicateFinder, DuplicateGroup, FinderConfig};
use photodedup::output::{DuplicateReport, ReportStatus};
use photodedup::scanner::{scan, ScanError};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn write_file(dir: &Path, name: &str, content: &[u8]) {
    File::create(dir.join(name))
        .unwrap()
        .write_all(content)
        .unwrap();
}

fn finder(min_size: u64) -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_min_size(min_size))
}

fn names(group: &DuplicateGroup) -> Vec<String> {
    group
        .files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_scan_photo_scenario() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.jpg", &[b'X'; 1000]);
    write_file(dir.path(), "b.jpg", &[b'X'; 1000]);
    write_file(dir.path(), "c.jpg", &[b'Y'; 1000]);
    write_file(dir.path(), "d.jpg", &[b'Z'; 2000]);

    let (groups, summary) = finder(0).find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(names(&groups[0]), vec!["a.jpg", "b.jpg"]);
    assert_eq!(groups[0].reclaimable_bytes(), 1000);
    assert_eq!(summary.total_files, 4);
    assert_eq!(summary.reclaimable_space, 1000);
    assert!(summary.scan_errors.is_empty());

    let report = DuplicateReport::from_groups(&groups);
    assert_eq!(report.status, ReportStatus::DuplicatesFound);
    assert_eq!(report.group_count, 1);
    assert_eq!(report.total_duplicate_files, 2);
    assert_eq!(report.reclaimable_bytes, 1000);
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let report = DuplicateReport::from_groups(&groups);

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert!(summary.scan_errors.is_empty());
    assert_eq!(report.status, ReportStatus::NoDuplicates);
    assert_eq!(report.group_count, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.jpg", b"content a");
    write_file(dir.path(), "b.jpg", b"content b");
    write_file(dir.path(), "c.jpg", b"content c");

    let (groups, summary) = finder(0).find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_ignores_subdirectories() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("nested");
    fs::create_dir(&sub).unwrap();

    write_file(dir.path(), "a.jpg", b"same bytes");
    write_file(&sub, "a.jpg", b"same bytes");

    let (groups, summary) = finder(0).find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_scan_min_size_filter() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "small1.jpg", &[1u8; 500]);
    write_file(dir.path(), "small2.jpg", &[1u8; 500]);
    write_file(dir.path(), "big1.jpg", &[2u8; 2048]);
    write_file(dir.path(), "big2.jpg", &[2u8; 2048]);

    let inventory = scan(dir.path(), 1024).unwrap();
    assert_eq!(inventory.records.len(), 2);
    assert!(inventory.records.iter().all(|r| r.size >= 1024));

    let (groups, _) = finder(1024).find_duplicates(dir.path()).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(names(&groups[0]), vec!["big1.jpg", "big2.jpg"]);
}

#[test]
fn test_scan_same_prefix_and_suffix_different_middle() {
    let dir = tempdir().unwrap();
    let mut a = vec![0u8; 64 * 1024];
    let mut b = a.clone();
    a[32 * 1024] = 1;
    b[32 * 1024] = 2;
    write_file(dir.path(), "a.raw", &a);
    write_file(dir.path(), "b.raw", &b);

    let config = FinderConfig::default().with_min_size(0).with_sample_size(4096);
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.eliminated_by_sample, 0);
}

#[test]
fn test_scan_without_sample_phase() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.jpg", &[7u8; 3000]);
    write_file(dir.path(), "b.jpg", &[7u8; 3000]);
    write_file(dir.path(), "c.jpg", &[8u8; 3000]);

    let config = FinderConfig::default().with_sample_hash(false);
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.eliminated_by_sample, 0);
}

#[test]
fn test_scan_is_idempotent() {
    let dir = tempdir().unwrap();
    for i in 0..4 {
        write_file(dir.path(), &format!("x{i}.jpg"), &[b'x'; 1500]);
    }
    for i in 0..3 {
        write_file(dir.path(), &format!("y{i}.jpg"), &[b'y'; 1500]);
    }
    write_file(dir.path(), "z.jpg", &[b'z'; 1500]);

    let finder = finder(0);
    let (first, first_summary) = finder.find_duplicates(dir.path()).unwrap();
    let (second, second_summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(
        first_summary.reclaimable_space,
        second_summary.reclaimable_space
    );
    assert_eq!(first_summary.reclaimable_space, 1500 * 3 + 1500 * 2);
}

#[test]
fn test_scan_nonexistent_root() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");

    let err = DuplicateFinder::with_defaults()
        .find_duplicates(&missing)
        .unwrap_err();
    assert!(matches!(
        err,
        photodedup::duplicates::FinderError::PathNotFound(_)
    ));

    assert!(matches!(scan(&missing, 0), Err(ScanError::NotFound(_))));
}

#[test]
fn test_scan_file_as_root() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.jpg", b"data");

    let err = DuplicateFinder::with_defaults()
        .find_duplicates(&dir.path().join("a.jpg"))
        .unwrap_err();
    assert!(matches!(
        err,
        photodedup::duplicates::FinderError::NotADirectory(_)
    ));
}

#[cfg(unix)]
#[test]
fn test_scan_unreadable_file_is_reported_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.jpg", &[b'p'; 1200]);
    write_file(dir.path(), "b.jpg", &[b'p'; 1200]);
    write_file(dir.path(), "locked.jpg", &[b'p'; 1200]);

    let locked = dir.path().join("locked.jpg");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can still read the file
    if File::open(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let (groups, summary) = finder(0).find_duplicates(dir.path()).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(names(&groups[0]), vec!["a.jpg", "b.jpg"]);
    assert_eq!(summary.scan_errors.len(), 1);
    assert_eq!(summary.scan_errors[0].path(), locked.as_path());
}

#[test]
#[cfg(unix)]
fn test_scan_symlink_to_sibling_is_not_a_duplicate() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.jpg", &[b'S'; 1000]);
    std::os::unix::fs::symlink(dir.path().join("a.jpg"), dir.path().join("b.jpg")).unwrap();

    let (groups, summary) = finder(0).find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
    assert_eq!(summary.reclaimable_space, 0);
    assert!(summary.scan_errors.is_empty());
}

#[test]
#[cfg(unix)]
fn test_scan_hard_links_do_not_count_as_reclaimable() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.jpg", &[b'H'; 1000]);
    fs::hard_link(dir.path().join("a.jpg"), dir.path().join("b.jpg")).unwrap();
    write_file(dir.path(), "c.jpg", &[b'H'; 1000]);

    let (groups, summary) = finder(0).find_duplicates(dir.path()).unwrap();

    // c.jpg is a real copy; b.jpg is a second name for a.jpg
    assert_eq!(groups.len(), 1);
    assert_eq!(names(&groups[0]), vec!["a.jpg", "c.jpg"]);
    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.reclaimable_space, 1000);
}
