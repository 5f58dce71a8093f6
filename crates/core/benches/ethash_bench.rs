//! Benchmarks for the Ethash pipeline
//!
//! Uses a 1021-row cache so setup stays fast; per-hash cost scales with
//! parents and accesses, not with cache size.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ethash_core::{Cache, Dataset, Light, calc_dataset_item, hashimoto, seed_hash};

const CACHE_BYTES: u64 = 64 * 1021;
const DATASET_BYTES: u64 = 128 * 4099;

fn bench_seed(c: &mut Criterion) {
    c.bench_function("seed_hash_epoch_100", |b| b.iter(|| seed_hash(black_box(100))));
}

fn bench_cache(c: &mut Criterion) {
    c.bench_function("cache_build_1021_rows", |b| {
        b.iter(|| Cache::build(black_box(CACHE_BYTES), 0).unwrap())
    });
}

fn bench_dataset_item(c: &mut Criterion) {
    let cache = Cache::build(CACHE_BYTES, 0).unwrap();

    c.bench_function("dataset_item", |b| {
        let mut index: u32 = 0;
        b.iter(|| {
            index = index.wrapping_add(1);
            calc_dataset_item(&cache, black_box(index))
        })
    });
}

fn bench_hashimoto(c: &mut Criterion) {
    let cache = Cache::build(CACHE_BYTES, 0).unwrap();
    let light = Light::new(&cache, DATASET_BYTES).unwrap();
    let full = Dataset::generate(&cache, DATASET_BYTES).unwrap();
    let header = [0u8; 32];

    c.bench_function("hashimoto_light", |b| {
        let mut nonce: u64 = 0;
        b.iter(|| {
            nonce = nonce.wrapping_add(1);
            hashimoto(&light, black_box(&header), nonce)
        })
    });

    c.bench_function("hashimoto_full", |b| {
        let mut nonce: u64 = 0;
        b.iter(|| {
            nonce = nonce.wrapping_add(1);
            hashimoto(&full, black_box(&header), nonce)
        })
    });
}

criterion_group!(
    benches,
    bench_seed,
    bench_cache,
    bench_dataset_item,
    bench_hashimoto
);
criterion_main!(benches);
