use filetime::{set_file_mtime, FileTime};
use photodedup::duplicates::{resolve, DuplicateFinder, FinderConfig, RetentionPolicy};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_with_mtime(dir: &Path, name: &str, content: &[u8], secs: i64) {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(secs, 0)).unwrap();
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

#[test]
fn test_keep_oldest_breaks_ties_by_scan_order() {
    let dir = tempdir().unwrap();
    let content = vec![b'r'; 1500];
    write_with_mtime(dir.path(), "A.jpg", &content, 100);
    write_with_mtime(dir.path(), "B.jpg", &content, 50);
    write_with_mtime(dir.path(), "C.jpg", &content, 50);

    let finder = DuplicateFinder::new(FinderConfig::default().with_min_size(0));
    let (groups, _) = finder.find_duplicates(dir.path()).unwrap();
    assert_eq!(groups.len(), 1);

    let plans = resolve(&groups, RetentionPolicy::KeepOldest);
    assert_eq!(plans.len(), 1);
    assert_eq!(file_name(&plans[0].keep.path), "B.jpg");

    let removed: Vec<String> = plans[0].remove.iter().map(|r| file_name(&r.path)).collect();
    assert_eq!(removed, vec!["A.jpg", "C.jpg"]);
    assert_eq!(plans[0].reclaimable_bytes(), 3000);
}

#[test]
fn test_keep_newest() {
    let dir = tempdir().unwrap();
    let content = vec![b'n'; 1500];
    write_with_mtime(dir.path(), "A.jpg", &content, 100);
    write_with_mtime(dir.path(), "B.jpg", &content, 300);
    write_with_mtime(dir.path(), "C.jpg", &content, 300);

    let finder = DuplicateFinder::new(FinderConfig::default().with_min_size(0));
    let (groups, _) = finder.find_duplicates(dir.path()).unwrap();

    let plans = resolve(&groups, RetentionPolicy::KeepNewest);
    assert_eq!(file_name(&plans[0].keep.path), "B.jpg");
    assert_eq!(plans[0].remove.len(), 2);
}

#[test]
fn test_resolve_is_deterministic() {
    let dir = tempdir().unwrap();
    let content = vec![b'd'; 2048];
    for (i, secs) in [500, 200, 200, 900].iter().enumerate() {
        write_with_mtime(dir.path(), &format!("img{i}.jpg"), &content, *secs);
    }

    let finder = DuplicateFinder::with_defaults();
    let (first, _) = finder.find_duplicates(dir.path()).unwrap();
    let (second, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(
        resolve(&first, RetentionPolicy::KeepOldest),
        resolve(&second, RetentionPolicy::KeepOldest)
    );
    assert_eq!(
        file_name(&resolve(&first, RetentionPolicy::KeepOldest)[0].keep.path),
        "img1.jpg"
    );
}
