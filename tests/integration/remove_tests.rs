use filetime::{set_file_mtime, FileTime};
use photodedup::actions::{apply, DeleteConfig, DeleteError, NoopDeleteCallback};
use photodedup::duplicates::{resolve, DuplicateFinder, FinderConfig, RetentionPolicy};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_with_mtime(dir: &Path, name: &str, content: &[u8], secs: i64) {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(secs, 0)).unwrap();
}

fn find_plans(dir: &Path) -> Vec<photodedup::duplicates::RemovalPlan> {
    let finder = DuplicateFinder::new(FinderConfig::default().with_min_size(0));
    let (groups, _) = finder.find_duplicates(dir).unwrap();
    resolve(&groups, RetentionPolicy::KeepOldest)
}

#[test]
fn test_remove_keeps_one_copy_per_group() {
    let dir = tempdir().unwrap();
    write_with_mtime(dir.path(), "a.jpg", &[1u8; 1000], 300);
    write_with_mtime(dir.path(), "b.jpg", &[1u8; 1000], 100);
    write_with_mtime(dir.path(), "c.jpg", &[1u8; 1000], 200);
    write_with_mtime(dir.path(), "d.jpg", &[2u8; 2000], 100);
    write_with_mtime(dir.path(), "e.jpg", &[2u8; 2000], 50);

    let plans = find_plans(dir.path());
    let outcome = apply::<NoopDeleteCallback>(&plans, &DeleteConfig::default(), None);

    assert!(outcome.all_succeeded());
    assert_eq!(outcome.success_count(), 3);
    assert_eq!(outcome.bytes_freed, 2000 + 2000);

    assert!(!dir.path().join("a.jpg").exists());
    assert!(dir.path().join("b.jpg").exists());
    assert!(!dir.path().join("c.jpg").exists());
    assert!(!dir.path().join("d.jpg").exists());
    assert!(dir.path().join("e.jpg").exists());

    // Nothing left to remove on a second pass
    assert!(find_plans(dir.path()).is_empty());
}

#[test]
fn test_remove_dry_run_touches_nothing() {
    let dir = tempdir().unwrap();
    write_with_mtime(dir.path(), "a.jpg", &[3u8; 1000], 100);
    write_with_mtime(dir.path(), "b.jpg", &[3u8; 1000], 200);

    let plans = find_plans(dir.path());
    let config = DeleteConfig::default().with_dry_run(true);
    let outcome = apply::<NoopDeleteCallback>(&plans, &config, None);

    assert!(outcome.dry_run);
    assert_eq!(outcome.success_count(), 1);
    assert_eq!(outcome.bytes_freed, 1000);
    assert!(dir.path().join("a.jpg").exists());
    assert!(dir.path().join("b.jpg").exists());
    assert!(outcome.summary().starts_with("Would delete"));
}

#[test]
fn test_remove_continues_past_failures() {
    let dir = tempdir().unwrap();
    write_with_mtime(dir.path(), "a.jpg", &[4u8; 1000], 100);
    write_with_mtime(dir.path(), "b.jpg", &[4u8; 1000], 200);
    write_with_mtime(dir.path(), "c.jpg", &[4u8; 1000], 300);

    let plans = find_plans(dir.path());
    assert_eq!(plans[0].remove.len(), 2);

    // Vanishes between scan and removal
    fs::remove_file(dir.path().join("b.jpg")).unwrap();

    let outcome = apply::<NoopDeleteCallback>(&plans, &DeleteConfig::default(), None);

    assert_eq!(outcome.failure_count(), 1);
    assert_eq!(outcome.success_count(), 1);
    assert!(matches!(outcome.failures[0].1, DeleteError::NotFound(_)));
    assert!(dir.path().join("a.jpg").exists());
    assert!(!dir.path().join("c.jpg").exists());
}

#[test]
fn test_remove_skips_file_modified_after_scan() {
    let dir = tempdir().unwrap();
    write_with_mtime(dir.path(), "a.jpg", &[5u8; 1000], 100);
    write_with_mtime(dir.path(), "b.jpg", &[5u8; 1000], 200);

    let plans = find_plans(dir.path());
    set_file_mtime(dir.path().join("b.jpg"), FileTime::from_unix_time(999, 0)).unwrap();

    let outcome = apply::<NoopDeleteCallback>(&plans, &DeleteConfig::default(), None);

    assert!(matches!(outcome.failures[0].1, DeleteError::Modified(_)));
    assert!(dir.path().join("b.jpg").exists());

    let unchecked = DeleteConfig::default().with_verify_unchanged(false);
    let outcome = apply::<NoopDeleteCallback>(&plans, &unchecked, None);
    assert!(outcome.all_succeeded());
    assert!(!dir.path().join("b.jpg").exists());
}

#[test]
fn test_remove_paranoid_detects_rewritten_copy() {
    let dir = tempdir().unwrap();
    write_with_mtime(dir.path(), "a.jpg", &[6u8; 1000], 100);
    write_with_mtime(dir.path(), "b.jpg", &[6u8; 1000], 200);

    let plans = find_plans(dir.path());

    // Same size and mtime, different bytes
    write_with_mtime(dir.path(), "b.jpg", &[7u8; 1000], 200);

    let config = DeleteConfig::default().with_paranoid(true);
    let outcome = apply::<NoopDeleteCallback>(&plans, &config, None);

    assert!(matches!(
        outcome.failures[0].1,
        DeleteError::ContentMismatch { .. }
    ));
    assert!(dir.path().join("b.jpg").exists());
}

#[test]
fn test_remove_keeps_copies_when_retained_file_vanished() {
    let dir = tempdir().unwrap();
    write_with_mtime(dir.path(), "a.jpg", &[8u8; 1000], 100);
    write_with_mtime(dir.path(), "b.jpg", &[8u8; 1000], 200);
    write_with_mtime(dir.path(), "c.jpg", &[8u8; 1000], 300);

    let plans = find_plans(dir.path());
    assert_eq!(plans[0].keep.path, dir.path().join("a.jpg"));

    // The oldest copy is moved away between scan and removal
    fs::remove_file(dir.path().join("a.jpg")).unwrap();

    let outcome = apply::<NoopDeleteCallback>(&plans, &DeleteConfig::default(), None);

    assert_eq!(outcome.success_count(), 0);
    assert_eq!(outcome.failure_count(), 2);
    assert!(outcome
        .failures
        .iter()
        .all(|(_, e)| matches!(e, DeleteError::RetainedChanged { .. })));
    assert!(dir.path().join("b.jpg").exists());
    assert!(dir.path().join("c.jpg").exists());
}
