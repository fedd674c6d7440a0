//! Benchmark workloads for the Strata arena allocator.
//!
//! Provides deterministic allocation-size profiles for benchmarks:
//!
//! - [`parse_tree_profile`]: many small nodes with the odd large buffer
//! - [`request_profile`]: mid-sized per-request scratch allocations
//! - [`uniform_profile`]: fixed-size objects, the best case for a bump allocator

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Sizes shaped like a parse tree: mostly 16–128 byte nodes, with roughly
/// one in fifty allocations being a 1–8 KiB string or token buffer.
pub fn parse_tree_profile(seed: u64, count: usize) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            if rng.gen_ratio(1, 50) {
                rng.gen_range(1024..=8192)
            } else {
                rng.gen_range(16..=128)
            }
        })
        .collect()
}

/// Sizes shaped like per-request scratch space: 256 B to 4 KiB.
pub fn request_profile(seed: u64, count: usize) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen_range(256..=4096)).collect()
}

/// `count` allocations of exactly `size` bytes.
pub fn uniform_profile(size: usize, count: usize) -> Vec<usize> {
    vec![size; count]
}

/// Total bytes a profile needs once every request is rounded up to `align`.
pub fn aligned_total(sizes: &[usize], align: usize) -> usize {
    sizes
        .iter()
        .map(|&s| s.div_ceil(align).max(1) * align)
        .sum()
}
