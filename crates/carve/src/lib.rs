//! Carve: a sharded free-range allocator for fixed-capacity arenas.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Carve sub-crates. For most users, adding `carve` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use carve::prelude::*;
//!
//! let arena = Arena::new(ArenaConfig::new(4096).with_strategy(StrategyKind::BestFit)).unwrap();
//!
//! let a = arena.allocate(1000).unwrap();
//! let b = arena.allocate(500).unwrap();
//! assert_eq!(b.offset(), Offset(1000));
//!
//! // A second handle keeps the region alive after the first is gone.
//! let a2 = a.clone();
//! drop(a);
//! assert_eq!(arena.stats().free_bytes, 4096 - 1500);
//!
//! // Releasing the last handles merges everything back into one range.
//! drop(a2);
//! drop(b);
//! assert_eq!(arena.free_list().as_range_set(), vec![Range::new(0, 4095)]);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `carve-core` | `Offset`, `Span`, `Range`, `BySize`, allocation errors |
//! | [`index`] | `carve-index` | Ordered-set abstraction, shard boundaries, `ShardedIndex` |
//! | [`arena`] | `carve-arena` | Free list, extraction strategies, reference counts, arena facade |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core value types and errors (`carve-core`).
///
/// [`types::Range`] is the closed byte interval every other crate trades
/// in; [`types::BySize`] orders ranges by size for the size index.
pub use carve_core as types;

/// Concurrent ordered index (`carve-index`).
///
/// [`index::ShardedIndex`] partitions an ordered set into independently
/// locked shards by [`index::ShardBoundaries`].
pub use carve_index as index;

/// Free list, strategies and the arena facade (`carve-arena`).
///
/// Most users only need [`arena::Arena`] and [`arena::RegionRef`]; they
/// are also available in the [`prelude`].
pub use carve_arena as arena;

/// Common imports for typical Carve usage.
///
/// ```rust
/// use carve::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use carve_core::{AllocError, BySize, Offset, Range, Span};

    // Index
    pub use carve_index::{ShardBoundaries, ShardedIndex};

    // Arena
    pub use carve_arena::{
        Arena, ArenaConfig, ArenaError, FreeList, FreeListStats, RefCounts, RegionRef,
        StrategyKind,
    };
}
