//! The sharded ordered index.
//!
//! Exact whole-structure ordering would need a single lock. Instead the
//! key space is cut into a fixed, small number of shards, each with its
//! own lock. Because shards are ordered by their boundaries, the global
//! order is the concatenation of the shard orders:
//!
//! - `last`/`poll_last` scan from the highest shard down.
//! - `higher`/`ceiling` start in the probe's shard and scan upward.
//! - `lower`/`floor` start in the probe's shard and scan downward.
//!
//! No call holds more than one shard lock at a time, so there is no
//! lock-ordering deadlock. The flip side is that a multi-shard query is
//! not an atomic snapshot: a concurrent insert into a shard the scan has
//! already passed is not observed.

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};

use smallvec::SmallVec;

use crate::boundary::{ShardBoundaries, ShardKey};
use crate::ordered_set::{BTreeFactory, OrderedSet, OrderedSetFactory};

/// A concurrent ordered index partitioned into independently locked
/// shards.
///
/// `T` is the item type; its [`Ord`] is the global order and its
/// [`ShardKey`] picks the shard. `S` is the per-shard set type.
pub struct ShardedIndex<T, S = BTreeSet<T>> {
    boundaries: ShardBoundaries,
    shards: SmallVec<[Mutex<S>; 8]>,
    _item: PhantomData<fn() -> T>,
}

// Compile-time assertion: the default index must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<ShardedIndex<u64>>();
};

impl<T> ShardedIndex<T, BTreeSet<T>>
where
    T: Ord + Clone + ShardKey,
{
    /// Build a `BTreeSet`-backed index over the given boundaries.
    pub fn with_boundaries(boundaries: ShardBoundaries) -> Self {
        Self::new(boundaries, &BTreeFactory)
    }
}

impl<T, S> ShardedIndex<T, S>
where
    T: Ord + Clone + ShardKey,
    S: OrderedSet<T>,
{
    /// Build an index with one set per boundary, each created by `factory`.
    pub fn new<F>(boundaries: ShardBoundaries, factory: &F) -> Self
    where
        F: OrderedSetFactory<T, Set = S>,
    {
        let shards = (0..boundaries.len())
            .map(|_| Mutex::new(factory.create()))
            .collect();
        log::debug!("sharded index created with {} shards", boundaries.len());
        Self {
            boundaries,
            shards,
            _item: PhantomData,
        }
    }

    /// Lock shard `idx`.
    ///
    /// A poisoned shard is recovered: every set operation either completes
    /// or leaves the set unchanged, so the data behind the lock is intact.
    fn shard(&self, idx: usize) -> MutexGuard<'_, S> {
        self.shards[idx]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The boundaries this index was built with.
    pub fn boundaries(&self) -> &ShardBoundaries {
        &self.boundaries
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard that owns `item`.
    pub fn find_shard(&self, item: &T) -> usize {
        self.boundaries.find_shard(item.shard_key())
    }

    /// Insert `item` into its shard. Returns `false` if already present.
    pub fn add(&self, item: T) -> bool {
        let idx = self.find_shard(&item);
        self.shard(idx).insert(item)
    }

    /// Remove `item` from its shard. Returns `false` if absent.
    pub fn remove(&self, item: &T) -> bool {
        let idx = self.find_shard(item);
        self.shard(idx).remove(item)
    }

    /// Remove every item; `true` only if every one of them was present.
    ///
    /// All removals are attempted even after one misses.
    pub fn remove_all<'a, I>(&self, items: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        items
            .into_iter()
            .fold(true, |all, item| self.remove(item) && all)
    }

    /// Whether `item` is present.
    pub fn contains(&self, item: &T) -> bool {
        let idx = self.find_shard(item);
        self.shard(idx).contains(item)
    }

    /// Smallest item overall.
    pub fn first(&self) -> Option<T> {
        (0..self.shards.len()).find_map(|idx| self.shard(idx).first())
    }

    /// Largest item overall.
    pub fn last(&self) -> Option<T> {
        (0..self.shards.len())
            .rev()
            .find_map(|idx| self.shard(idx).last())
    }

    /// Remove and return the largest item overall.
    pub fn poll_last(&self) -> Option<T> {
        (0..self.shards.len())
            .rev()
            .find_map(|idx| self.shard(idx).pop_last())
    }

    /// Smallest item strictly greater than `item`.
    pub fn higher(&self, item: &T) -> Option<T> {
        (self.find_shard(item)..self.shards.len()).find_map(|idx| self.shard(idx).higher(item))
    }

    /// Smallest item greater than or equal to `item`.
    pub fn ceiling(&self, item: &T) -> Option<T> {
        (self.find_shard(item)..self.shards.len()).find_map(|idx| self.shard(idx).ceiling(item))
    }

    /// Largest item strictly less than `item`.
    pub fn lower(&self, item: &T) -> Option<T> {
        (0..=self.find_shard(item))
            .rev()
            .find_map(|idx| self.shard(idx).lower(item))
    }

    /// Largest item less than or equal to `item`.
    pub fn floor(&self, item: &T) -> Option<T> {
        (0..=self.find_shard(item))
            .rev()
            .find_map(|idx| self.shard(idx).floor(item))
    }

    /// Total number of items, summed shard by shard.
    pub fn len(&self) -> usize {
        (0..self.shards.len()).map(|idx| self.shard(idx).len()).sum()
    }

    /// Whether every shard is empty.
    pub fn is_empty(&self) -> bool {
        (0..self.shards.len()).all(|idx| self.shard(idx).is_empty())
    }

    /// Remove every item from every shard.
    pub fn clear(&self) {
        for idx in 0..self.shards.len() {
            self.shard(idx).clear();
        }
    }

    /// Per-shard item counts, lowest shard first.
    pub fn shard_lens(&self) -> Vec<usize> {
        (0..self.shards.len()).map(|idx| self.shard(idx).len()).collect()
    }

    /// All items in global order.
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::new();
        for idx in 0..self.shards.len() {
            out.extend(self.shard(idx).to_vec());
        }
        out
    }
}
