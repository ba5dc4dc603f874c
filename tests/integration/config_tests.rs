use crate::ENV_MUTEX;
use photodedup::config::{Config, ConfigError};
use photodedup::duplicates::RetentionPolicy;
use std::env;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_load_from_explicit_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let path = dir.path().join("photodedup.toml");
    fs::write(
        &path,
        "min_size = 0\nuse_sample_hash = false\nio_threads = 2\nkeep = \"newest\"\n",
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();

    assert_eq!(config.min_size, 0);
    assert!(!config.use_sample_hash);
    assert_eq!(config.io_threads, 2);
    assert_eq!(config.keep, RetentionPolicy::KeepNewest);
    assert_eq!(config.sample_size, 8192);
}

#[test]
fn test_env_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let path = dir.path().join("photodedup.toml");
    fs::write(&path, "min_size = 0\nsample_size = 1024\n").unwrap();

    env::set_var("PHOTODEDUP_MIN_SIZE", "4096");
    let result = Config::load_from_path(&path);
    env::remove_var("PHOTODEDUP_MIN_SIZE");

    let config = result.unwrap();
    assert_eq!(config.min_size, 4096);
    assert_eq!(config.sample_size, 1024);
}

#[test]
fn test_invalid_value_is_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let path = dir.path().join("photodedup.toml");
    fs::write(&path, "keep = \"largest\"\n").unwrap();

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_saved_config_loads_back() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let path = dir.path().join("saved.toml");
    let config = Config {
        min_size: 10,
        use_sample_hash: true,
        sample_size: 512,
        io_threads: 1,
        keep: RetentionPolicy::KeepNewest,
    };

    config.save_to(&path).unwrap();
    assert_eq!(Config::load_from_path(&path).unwrap(), config);
}

#[test]
fn test_finder_config_follows_loaded_values() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let path = dir.path().join("photodedup.toml");
    fs::write(&path, "min_size = 0\nio_threads = 0\n").unwrap();

    let finder = Config::load_from_path(&path).unwrap().finder_config();

    assert_eq!(finder.min_size, 0);
    // At least one worker
    assert_eq!(finder.io_threads, 1);
}
