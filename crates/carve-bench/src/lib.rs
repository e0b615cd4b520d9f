//! Benchmark profiles for the Carve allocator.
//!
//! Provides pre-built [`ArenaConfig`] profiles and workloads:
//!
//! - [`reference_profile`]: 16 MiB arena, default shards, best-fit
//! - [`stress_profile`]: 1 GiB arena with fine-grained shards
//! - [`fragmented_list`]: a free list pre-churned into many small holes
//! - [`index_fixture`]: a sharded size index filled with seeded ranges

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use carve_arena::{ArenaConfig, FreeList, StrategyKind};
use carve_core::{BySize, Range};
use carve_index::{ShardBoundaries, ShardedIndex};
use carve_test_utils::{run_ops, LiveSet, OpStream};

/// 16 MiB arena with default shards and the given strategy.
pub fn reference_profile(strategy: StrategyKind) -> ArenaConfig {
    ArenaConfig::new(16 << 20).with_strategy(strategy)
}

/// 1 GiB arena, shards starting at 64 bytes.
pub fn stress_profile(strategy: StrategyKind) -> ArenaConfig {
    ArenaConfig::new(1 << 30)
        .with_min_shard_size(64)
        .with_strategy(strategy)
}

/// A free list after `ops` seeded operations, plus the regions still held.
///
/// Request sizes are drawn from `1..=max_size`.
pub fn fragmented_list(config: &ArenaConfig, seed: u64, ops: usize, max_size: u64) -> (FreeList, LiveSet) {
    let list = FreeList::new(config).expect("benchmark profile config is valid");
    let mut live = LiveSet::new();
    run_ops(&list, OpStream::new(seed, max_size).take(ops), &mut live);
    (list, live)
}

/// Exponentially sharded size index holding `n` seeded, disjoint ranges.
pub fn index_fixture(n: usize, seed: u64) -> ShardedIndex<BySize> {
    // Exponential from 16 up to 1 MiB.
    let boundaries = ShardBoundaries::exponential(16, 1 << 20).expect("non-zero min size");
    let index = ShardedIndex::with_boundaries(boundaries);
    let mut lower = 0;
    for op in OpStream::new(seed, 1 << 20).with_free_ratio(0.0).take(n) {
        if let carve_test_utils::Op::Alloc(len) = op {
            index.add(BySize(Range::with_len(lower, len)));
            lower += len + 1;
        }
    }
    index
}
