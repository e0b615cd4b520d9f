//! Sharded ordered index for the Carve free-range allocator.
//!
//! A [`ShardedIndex`] approximates a single totally-ordered set by
//! partitioning items into a small, fixed number of shards keyed by a
//! boundary value (for the allocator, the range size). Each shard is an
//! independently locked ordered set, so operations that land in
//! different shards proceed concurrently.
//!
//! # Architecture
//!
//! ```text
//! ShardedIndex<T, S>
//! ├── ShardBoundaries (ascending u64 keys, last = u64::MAX catch-all)
//! └── Mutex<S> × n   (S: OrderedSet<T>, built by an OrderedSetFactory)
//! ```
//!
//! Navigational queries (`higher`, `ceiling`, `lower`, `floor`) start in
//! the probe's own shard and fall back to a linear scan over neighbouring
//! shards, locking one shard at a time.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boundary;
pub mod ordered_set;
pub mod sharded;

pub use boundary::{BoundaryError, ShardBoundaries, ShardKey};
pub use ordered_set::{BTreeFactory, OrderedSet, OrderedSetFactory, SortedVecFactory, SortedVecSet};
pub use sharded::ShardedIndex;
