//! Free-list arena allocation with reference-counted regions.
//!
//! Tracks the free bytes of a linear address range, hands out regions by
//! offset, and merges freed regions back with their free neighbours.
//!
//! # Architecture
//!
//! ```text
//! Arena<B: Backing> (facade)
//! ├── B: Backing (HeapBacking = RwLock<Vec<u8>>)
//! └── RefCounts (RwLock<IndexMap<Offset, AtomicU64>>)
//!     └── Arc<FreeList> (one Mutex over both indices)
//!         ├── by_start: OrderedSet<Range>       (coalescing neighbours)
//!         ├── by_size:  ShardedIndex<BySize>    (block selection)
//!         └── Box<dyn ExtractionStrategy>       (BestFit | LargestRange)
//! ```
//!
//! `Arena::allocate` returns a [`RegionRef`]. Cloning the handle adds a
//! reference; when the last handle drops, the region goes back to the
//! free list.
//!
//! # Failure model
//!
//! Running out of space is a recoverable [`AllocError`]. A broken
//! allocator invariant (double free, a reference count going negative)
//! is logged at `error` level and panics.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod backing;
pub mod config;
pub mod error;
pub mod free_list;
pub mod handle;
pub mod refcount;
pub mod stats;
pub mod strategy;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use backing::{Backing, HeapBacking};
pub use carve_core::AllocError;
pub use config::ArenaConfig;
pub use error::{ArenaError, ConsistencyError};
pub use free_list::{FreeList, RangeSetFactory};
pub use handle::RegionRef;
pub use refcount::RefCounts;
pub use stats::FreeListStats;
pub use strategy::{BestFit, ExtractionStrategy, FreeRanges, LargestRange, StrategyKind};
