use crate::ENV_MUTEX;
use clap::Parser;
use photodedup::cli::Cli;
use photodedup::error::ExitCode;
use photodedup::run_app;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn config_file(dir: &TempDir) -> String {
    let path = dir.path().join("photodedup.toml");
    fs::write(&path, "min_size = 0\n").unwrap();
    path.to_string_lossy().into_owned()
}

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let cli = Cli::try_parse_from(args).unwrap();
    run_app(cli)
}

fn photo_dir() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.jpg"), [b'X'; 1000]).unwrap();
    fs::write(dir.path().join("b.jpg"), [b'X'; 1000]).unwrap();
    fs::write(dir.path().join("c.jpg"), [b'Y'; 1000]).unwrap();
    dir
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_scan_exit_codes() {
    let cfg = tempdir().unwrap();
    let config = config_file(&cfg);

    let photos = photo_dir();
    let code = run(&[
        "photodedup", "-q", "--config", &config, "scan", path_str(photos.path()), "--output", "json",
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);

    let empty = tempdir().unwrap();
    let code = run(&[
        "photodedup", "-q", "--config", &config, "scan", path_str(empty.path()), "--output", "csv",
    ])
    .unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_scan_missing_directory_is_an_error() {
    let cfg = tempdir().unwrap();
    let config = config_file(&cfg);
    let missing = cfg.path().join("missing");

    let err = run(&["photodedup", "-q", "--config", &config, "scan", path_str(&missing)]).unwrap_err();
    assert!(err
        .downcast_ref::<photodedup::duplicates::FinderError>()
        .is_some());
}

#[test]
fn test_missing_config_file_is_an_error() {
    let photos = photo_dir();
    let missing = photos.path().join("nope.toml");

    let result = run(&[
        "photodedup",
        "-q",
        "--config",
        path_str(&missing),
        "scan",
        path_str(photos.path()),
    ]);
    assert!(result.is_err());
}

#[test]
fn test_remove_dry_run_then_remove() {
    let cfg = tempdir().unwrap();
    let config = config_file(&cfg);
    let photos = photo_dir();

    let code = run(&[
        "photodedup", "-q", "--config", &config, "remove", path_str(photos.path()), "--dry-run",
        "--output", "json",
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(photos.path().join("b.jpg").exists());

    let code = run(&[
        "photodedup", "-q", "--config", &config, "remove", path_str(photos.path()), "-y",
        "--paranoid", "--output", "json",
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);

    let remaining = fs::read_dir(photos.path()).unwrap().count();
    assert_eq!(remaining, 2);
    assert!(photos.path().join("c.jpg").exists());

    let code = run(&[
        "photodedup", "-q", "--config", &config, "remove", path_str(photos.path()), "-y",
        "--output", "json",
    ])
    .unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}
