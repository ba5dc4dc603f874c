use criterion::{black_box, criterion_group, criterion_main, Criterion};
use photodedup::duplicates::{DuplicateFinder, FinderConfig};
use photodedup::scanner::{Hasher, Walker, WalkerConfig};
use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;

// Flat folder: `unique` distinct files plus `copies` copies of one file,
// all the same size so every file reaches the digest phases
fn setup_photo_dir(unique: usize, copies: usize, size: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();

    for i in 0..unique {
        let mut data = vec![b'p'; size];
        data[size / 2] = (i % 251) as u8;
        data[size / 2 + 1] = (i / 251) as u8;
        fs::write(temp_dir.path().join(format!("img_{i:04}.jpg")), &data)
            .expect("Failed to write file");
    }

    let original = vec![b'd'; size];
    for i in 0..copies {
        fs::write(temp_dir.path().join(format!("copy_{i:04}.jpg")), &original)
            .expect("Failed to write copy");
    }

    temp_dir
}

// 1. Directory Listing
fn bench_walker(c: &mut Criterion) {
    let temp_dir = setup_photo_dir(200, 0, 2048);
    let config = WalkerConfig::new(0);

    c.bench_function("walker_200_files", |b| {
        b.iter(|| {
            let walker = Walker::new(temp_dir.path(), config.clone());
            let files: Vec<_> = walker.walk().collect();
            black_box(files);
        })
    });
}

// 2. Sample vs Full Digest
fn bench_hasher(c: &mut Criterion) {
    let mut group = c.benchmark_group("hasher");
    let hasher = Hasher::new();

    for size_kb in [1, 1024, 10240] {
        // 1KB, 1MB, 10MB
        let data = vec![b'a'; size_kb * 1024];
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("bench_file.dat");
        fs::write(&file_path, &data).expect("Failed to write bench file");

        group.bench_with_input(format!("sample_{size_kb}KB"), &file_path, |b, path| {
            b.iter(|| black_box(hasher.sample_digest(path).unwrap()));
        });
        let len = data.len() as u64;
        group.bench_with_input(format!("full_{size_kb}KB"), &file_path, |b, path| {
            b.iter(|| black_box(hasher.full_digest(path, len).unwrap()));
        });
    }
    group.finish();
}

// 3. Full Pipeline, with and without the sample phase
fn bench_pipeline(c: &mut Criterion) {
    let temp_dir = setup_photo_dir(100, 10, 256 * 1024);
    let shutdown_flag = Arc::new(AtomicBool::new(false));

    let mut group = c.benchmark_group("pipeline_110_files");
    for use_sample in [true, false] {
        let config = FinderConfig::default()
            .with_sample_hash(use_sample)
            .with_shutdown_flag(Arc::clone(&shutdown_flag));
        let finder = DuplicateFinder::new(config);

        let name = if use_sample { "sampled" } else { "full_only" };
        group.bench_function(name, |b| {
            b.iter(|| black_box(finder.find_duplicates(temp_dir.path()).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_walker, bench_hasher, bench_pipeline);
criterion_main!(benches);
