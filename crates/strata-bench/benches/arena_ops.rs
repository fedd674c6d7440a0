//! Criterion micro-benchmarks for arena allocation, growth and reset.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use strata_arena::{Arena, ArenaConfig, ALIGNMENT};
use strata_bench::{aligned_total, parse_tree_profile, request_profile, uniform_profile};

/// Benchmark: 1000 uniform 32-byte allocations from a pre-sized Fixed arena.
fn bench_fixed_uniform_1k(c: &mut Criterion) {
    let sizes = uniform_profile(32, 1000);
    let capacity = aligned_total(&sizes, ALIGNMENT);
    let config = ArenaConfig::fixed().with_initial_capacity(capacity);
    let mut arena = Arena::with_config(config).unwrap();

    c.bench_function("fixed_uniform_1k", |b| {
        b.iter(|| {
            for &size in &sizes {
                black_box(arena.alloc(size).unwrap());
            }
            arena.reset();
        });
    });
}

/// Benchmark: a parse-tree workload on a fresh Dynamic arena, growth included.
fn bench_dynamic_parse_tree_cold(c: &mut Criterion) {
    let sizes = parse_tree_profile(42, 10_000);

    c.bench_function("dynamic_parse_tree_cold", |b| {
        b.iter(|| {
            let arena = Arena::dynamic().unwrap();
            for &size in &sizes {
                black_box(arena.alloc(size).unwrap());
            }
            black_box(arena.region_count());
        });
    });
}

/// Benchmark: the same parse-tree workload on a warmed arena that is reset
/// between iterations, so every region is reused.
fn bench_dynamic_parse_tree_warm(c: &mut Criterion) {
    let sizes = parse_tree_profile(42, 10_000);
    let mut arena = Arena::dynamic().unwrap();
    for &size in &sizes {
        arena.alloc(size).unwrap();
    }
    arena.reset();

    c.bench_function("dynamic_parse_tree_warm", |b| {
        b.iter(|| {
            for &size in &sizes {
                black_box(arena.alloc(size).unwrap());
            }
            arena.reset();
        });
    });
}

/// Benchmark: per-request scratch buffers, zeroed on allocation.
fn bench_request_zeroed(c: &mut Criterion) {
    let sizes = request_profile(7, 256);
    let mut arena = Arena::dynamic().unwrap();

    c.bench_function("request_zeroed", |b| {
        b.iter(|| {
            for &size in &sizes {
                black_box(arena.alloc_zeroed(size).unwrap());
            }
            arena.reset();
        });
    });
}

/// Baseline: the parse-tree workload through the global allocator.
fn bench_boxed_parse_tree_baseline(c: &mut Criterion) {
    let sizes = parse_tree_profile(42, 10_000);

    c.bench_function("boxed_parse_tree_baseline", |b| {
        b.iter(|| {
            let nodes: Vec<Box<[u8]>> = sizes
                .iter()
                .map(|&size| vec![0u8; size].into_boxed_slice())
                .collect();
            black_box(nodes.len());
        });
    });
}

criterion_group!(
    benches,
    bench_fixed_uniform_1k,
    bench_dynamic_parse_tree_cold,
    bench_dynamic_parse_tree_warm,
    bench_request_zeroed,
    bench_boxed_parse_tree_baseline
);
criterion_main!(benches);
