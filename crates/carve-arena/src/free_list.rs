//! The free-range registry of an arena.
//!
//! [`FreeList`] tracks every free byte of an arena as a set of disjoint,
//! non-adjacent [`Range`]s, held in two indices over the same set:
//!
//! - **by start**: one ordered set keyed by lower bound, used to find the
//!   neighbours of a freed range for coalescing.
//! - **by size**: a [`ShardedIndex`] keyed by size, used by the
//!   [`ExtractionStrategy`] to pick a block for each request.
//!
//! Every mutating call holds one lock across both indices. The size
//! index has its own per-shard locks, but those cannot keep the two
//! indices consistent with each other.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use carve_core::{AllocError, BySize, Offset, Range, Span};
use carve_index::{BTreeFactory, OrderedSet, OrderedSetFactory, ShardBoundaries, ShardedIndex};

use crate::config::ArenaConfig;
use crate::error::{ArenaError, ConsistencyError};
use crate::stats::FreeListStats;
use crate::strategy::{ExtractionStrategy, FreeRanges};

/// Factory able to build both free-list indices.
pub trait RangeSetFactory: OrderedSetFactory<Range> + OrderedSetFactory<BySize> {}

impl<F> RangeSetFactory for F where F: OrderedSetFactory<Range> + OrderedSetFactory<BySize> {}

type StartSet<F> = <F as OrderedSetFactory<Range>>::Set;
type SizeSet<F> = <F as OrderedSetFactory<BySize>>::Set;

/// Log and panic on a broken allocator invariant.
///
/// Callers release the free-list lock first so the lock is not poisoned.
#[cold]
#[track_caller]
pub(crate) fn invariant_violation(message: String) -> ! {
    log::error!("{message}");
    panic!("{message}");
}

/// Both indices plus the arena bound, guarded by the free-list lock.
struct FreeState<F: RangeSetFactory> {
    by_start: StartSet<F>,
    by_size: ShardedIndex<BySize, SizeSet<F>>,
    capacity: u64,
}

impl<F: RangeSetFactory> FreeState<F> {
    fn insert(&mut self, range: Range) {
        self.by_start.insert(range);
        self.by_size.add(BySize(range));
    }

    fn largest(&self) -> u64 {
        self.by_size.last().map_or(0, |b| b.0.size())
    }

    fn clear(&mut self) {
        self.by_start.clear();
        self.by_size.clear();
    }

    /// Hand out the first `size` bytes of `candidate`, reinserting the rest.
    fn consume(&mut self, candidate: Range, size: u64) {
        let remainder = candidate.shave(size);
        if !remainder.is_empty() {
            self.insert(remainder);
        }
    }
}

impl<F: RangeSetFactory> FreeRanges for FreeState<F> {
    fn ceiling_by_size(&self, size: u64) -> Option<Range> {
        self.by_size.ceiling(&BySize::probe(size)).map(|b| b.0)
    }

    fn poll_last_by_size(&mut self) -> Option<Range> {
        self.by_size.poll_last().map(|b| b.0)
    }

    fn remove_by_start(&mut self, range: &Range) -> bool {
        self.by_start.remove(range)
    }

    fn take(&mut self, range: &Range) -> bool {
        let in_size = self.by_size.remove(&BySize(*range));
        let in_start = self.by_start.remove(range);
        in_size && in_start
    }
}

/// Registry of the free ranges of one arena.
///
/// Thread-safe: all mutations serialise on an internal lock; the free
/// byte count is readable without it.
pub struct FreeList<F: RangeSetFactory = BTreeFactory> {
    state: Mutex<FreeState<F>>,
    /// Mirror of the total free bytes, updated under the lock.
    free_bytes: AtomicU64,
    strategy: Box<dyn ExtractionStrategy>,
}

// Compile-time assertion: FreeList must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<FreeList>();
};

impl FreeList<BTreeFactory> {
    /// Build a `BTreeSet`-backed free list from `config`.
    ///
    /// The whole arena starts out as one free range.
    pub fn new(config: &ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self::with_factory(
            config.capacity,
            config.boundaries()?,
            config.strategy.build(),
            &BTreeFactory,
        ))
    }
}

impl<F: RangeSetFactory> FreeList<F> {
    /// Build a free list over `capacity` bytes with explicit parts.
    pub fn with_factory(
        capacity: u64,
        boundaries: ShardBoundaries,
        strategy: Box<dyn ExtractionStrategy>,
        factory: &F,
    ) -> Self {
        let by_start = OrderedSetFactory::<Range>::create(factory);
        let by_size: ShardedIndex<BySize, SizeSet<F>> = ShardedIndex::new(boundaries, factory);
        log::debug!(
            "free list created: capacity={capacity}, shards={}, strategy={}",
            by_size.shard_count(),
            strategy.name()
        );
        let list = Self {
            state: Mutex::new(FreeState {
                by_start,
                by_size,
                capacity,
            }),
            free_bytes: AtomicU64::new(0),
            strategy,
        };
        list.reset(capacity);
        list
    }

    /// Lock both indices.
    ///
    /// Invariant checks run before any mutation and release the lock
    /// before panicking, so a poisoned lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, FreeState<F>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Name of the configured extraction strategy.
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Allocate exactly `size` bytes and return their offset.
    ///
    /// Fails with [`AllocError::Failed`] when no free range is large
    /// enough, reporting the largest size actually available.
    pub fn allocate(&self, size: u64) -> Result<Offset, AllocError> {
        if size == 0 {
            return Err(AllocError::ZeroSize);
        }
        let mut state = self.lock();
        if state.by_start.is_empty() {
            log::debug!("allocate({size}) failed: arena exhausted");
            return Err(AllocError::Failed {
                requested: size,
                largest_available: 0,
            });
        }

        match self.strategy.extract(&mut *state, size) {
            Some(candidate) if candidate.size() >= size => {
                state.consume(candidate, size);
                self.free_bytes.fetch_sub(size, Ordering::Release);
                log::trace!("allocate({size}) -> {} from {candidate}", candidate.lower());
                Ok(Offset(candidate.lower()))
            }
            other => {
                if let Some(too_small) = other {
                    state.insert(too_small);
                }
                let largest_available = state.largest();
                log::debug!("allocate({size}) failed: largest free range is {largest_available}");
                Err(AllocError::Failed {
                    requested: size,
                    largest_available,
                })
            }
        }
    }

    /// Allocate up to `size` bytes; never fails.
    ///
    /// When the best candidate is smaller than `size`, the whole candidate
    /// is granted. Returns [`Span::empty`] if nothing is free or
    /// `size == 0`.
    pub fn try_allocate(&self, size: u64) -> Span {
        if size == 0 {
            return Span::empty();
        }
        let mut state = self.lock();
        let candidate = match self.strategy.extract(&mut *state, size) {
            Some(candidate) => candidate,
            None => {
                // Nothing fits whole: the largest range is the best partial grant.
                let Some(largest) = state.poll_last_by_size() else {
                    return Span::empty();
                };
                state.remove_by_start(&largest);
                largest
            }
        };
        let granted = candidate.size().min(size);
        state.consume(candidate, granted);
        self.free_bytes.fetch_sub(granted, Ordering::Release);
        log::trace!("try_allocate({size}) -> {granted} bytes at {}", candidate.lower());
        Span::new(Offset(candidate.lower()), granted)
    }

    /// Return `size` bytes at `offset` to the free pool, merging with
    /// adjacent free ranges.
    ///
    /// # Panics
    ///
    /// Panics if any part of the region is already free (double free or
    /// corruption), or if it lies outside the arena.
    pub fn free(&self, offset: Offset, size: u64) {
        if size == 0 {
            return;
        }
        let Some(freed) = offset
            .get()
            .checked_add(size - 1)
            .map(|_| Range::with_len(offset.get(), size))
        else {
            invariant_violation(format!("free of {size} bytes at {offset} overflows u64"));
        };

        let mut state = self.lock();
        if freed.upper() >= state.capacity {
            let capacity = state.capacity;
            drop(state);
            invariant_violation(format!(
                "free of {freed} outside arena of {capacity} bytes"
            ));
        }

        let below = state.by_start.floor(&freed);
        let above = state.by_start.higher(&freed);
        for neighbour in below.iter().chain(above.iter()) {
            if neighbour.overlaps(&freed) {
                let neighbour = *neighbour;
                drop(state);
                invariant_violation(format!(
                    "free of {freed} overlaps free range {neighbour} (double free?)"
                ));
            }
        }

        let mut merged = freed;
        for neighbour in below.into_iter().chain(above) {
            if neighbour.is_adjacent_to(&merged) {
                state.take(&neighbour);
                merged = merged.span(&neighbour);
            }
        }
        state.insert(merged);
        self.free_bytes.fetch_add(size, Ordering::Release);
        log::trace!("free({offset}, {size}) -> {merged}");
    }

    /// Grow the arena's right edge by `size` bytes.
    ///
    /// The new bytes join the highest free range when it ends at the old
    /// edge; otherwise they become a new free range.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity overflows `u64`.
    pub fn extend(&self, size: u64) {
        if size == 0 {
            return;
        }
        let mut state = self.lock();
        let old = state.capacity;
        let Some(new_capacity) = old.checked_add(size) else {
            drop(state);
            invariant_violation(format!("extending arena of {old} bytes by {size} overflows u64"));
        };

        let grown = match state.by_start.last() {
            Some(last) if last.upper() + 1 == old => {
                state.take(&last);
                last.extend(size)
            }
            _ => Range::with_len(old, size),
        };
        state.insert(grown);
        state.capacity = new_capacity;
        self.free_bytes.fetch_add(size, Ordering::Release);
        log::debug!("free list extended: {old} -> {new_capacity} bytes, edge range {grown}");
    }

    /// Forget every range and start over with one free range of `size`
    /// bytes (none when `size == 0`).
    pub fn reset(&self, size: u64) {
        let mut state = self.lock();
        state.clear();
        if size > 0 {
            state.insert(Range::with_len(0, size));
        }
        state.capacity = size;
        self.free_bytes.store(size, Ordering::Release);
        log::debug!("free list reset to {size} bytes");
    }

    /// Total free bytes. O(1), lock-free.
    pub fn free_bytes(&self) -> u64 {
        self.free_bytes.load(Ordering::Acquire)
    }

    /// Arena size in bytes.
    pub fn capacity(&self) -> u64 {
        self.lock().capacity
    }

    /// Number of free ranges.
    pub fn range_count(&self) -> usize {
        self.lock().by_start.len()
    }

    /// Size of the largest free range, or 0.
    pub fn largest_free(&self) -> u64 {
        self.lock().largest()
    }

    /// Snapshot of the free ranges in start order.
    ///
    /// Diagnostic path: copies every range.
    pub fn as_range_set(&self) -> Vec<Range> {
        self.lock().by_start.to_vec()
    }

    /// Per-shard counts of the size index, lowest shard first.
    pub fn shard_lens(&self) -> Vec<usize> {
        self.lock().by_size.shard_lens()
    }

    /// Point-in-time summary of the free list.
    pub fn stats(&self) -> FreeListStats {
        let state = self.lock();
        FreeListStats {
            free_bytes: self.free_bytes(),
            capacity: state.capacity,
            range_count: state.by_start.len(),
            largest_free: state.largest(),
        }
    }

    /// Verify every structural invariant of the free list.
    ///
    /// Checks that both indices hold the same ranges, that no two ranges
    /// overlap or touch, that every range lies inside the arena, and that
    /// the cached free size matches.
    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        let state = self.lock();
        let by_start = state.by_start.to_vec();
        let by_size: BTreeSet<Range> = state.by_size.to_vec().into_iter().map(|b| b.0).collect();
        if by_start.len() != by_size.len() || by_start.iter().zip(&by_size).any(|(a, b)| a != b) {
            return Err(ConsistencyError::IndexMismatch {
                by_start,
                by_size: by_size.into_iter().collect(),
            });
        }

        for pair in by_start.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            if first.overlaps(&second) {
                return Err(ConsistencyError::Overlap { first, second });
            }
            if first.is_adjacent_to(&second) {
                return Err(ConsistencyError::Adjacent { first, second });
            }
        }

        if let Some(&range) = by_start.iter().find(|r| r.upper() >= state.capacity) {
            return Err(ConsistencyError::OutOfArena {
                range,
                capacity: state.capacity,
            });
        }

        let actual: u64 = by_start.iter().map(Range::size).sum();
        let cached = self.free_bytes();
        if actual != cached {
            return Err(ConsistencyError::SizeMismatch { cached, actual });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyKind;
    use carve_index::SortedVecFactory;

    fn list(capacity: u64) -> FreeList {
        FreeList::new(&ArenaConfig::new(capacity)).unwrap()
    }

    fn largest_first(capacity: u64) -> FreeList {
        FreeList::new(&ArenaConfig::new(capacity).with_strategy(StrategyKind::LargestRange)).unwrap()
    }

    #[test]
    fn new_list_is_one_full_range() {
        let fl = list(1000);
        assert_eq!(fl.free_bytes(), 1000);
        assert_eq!(fl.capacity(), 1000);
        assert_eq!(fl.as_range_set(), vec![Range::new(0, 999)]);
        fl.check_consistency().unwrap();
    }

    #[test]
    fn allocate_carves_from_the_front() {
        let fl = list(1000);
        assert_eq!(fl.allocate(400), Ok(Offset(0)));
        assert_eq!(fl.free_bytes(), 600);
        assert_eq!(fl.allocate(300), Ok(Offset(400)));
        assert_eq!(fl.free_bytes(), 300);
        assert_eq!(fl.as_range_set(), vec![Range::new(700, 999)]);
        fl.check_consistency().unwrap();
    }

    #[test]
    fn freeing_adjacent_regions_coalesces_into_one_range() {
        let fl = list(1000);
        fl.allocate(400).unwrap();
        fl.allocate(300).unwrap();

        fl.free(Offset(0), 400);
        assert_eq!(
            fl.as_range_set(),
            vec![Range::new(0, 399), Range::new(700, 999)]
        );

        // [400, 699] touches both neighbours: everything merges back.
        fl.free(Offset(400), 300);
        assert_eq!(fl.as_range_set(), vec![Range::new(0, 999)]);
        assert_eq!(fl.free_bytes(), 1000);
        fl.check_consistency().unwrap();

        assert_eq!(
            fl.allocate(1001),
            Err(AllocError::Failed {
                requested: 1001,
                largest_available: 1000
            })
        );
        assert_eq!(fl.allocate(1000), Ok(Offset(0)));
    }

    #[test]
    fn free_merges_with_lower_neighbour_only() {
        let fl = list(1000);
        fl.allocate(100).unwrap();
        fl.allocate(100).unwrap();
        fl.allocate(100).unwrap();
        fl.free(Offset(0), 100);
        fl.free(Offset(100), 100);
        assert_eq!(
            fl.as_range_set(),
            vec![Range::new(0, 199), Range::new(300, 999)]
        );
        fl.check_consistency().unwrap();
    }

    #[test]
    fn exhaustion_reports_largest_available() {
        let fl = list(1000);
        fl.allocate(100).unwrap();
        fl.allocate(500).unwrap();
        fl.free(Offset(0), 100);
        // Free: [0,99] and [600,999].
        assert_eq!(
            fl.allocate(401),
            Err(AllocError::Failed {
                requested: 401,
                largest_available: 400
            })
        );
        // The failed request left the free set untouched.
        assert_eq!(fl.free_bytes(), 500);
        assert_eq!(fl.range_count(), 2);
        fl.check_consistency().unwrap();
    }

    #[test]
    fn empty_list_fails_with_zero_available() {
        let fl = list(64);
        fl.allocate(64).unwrap();
        assert_eq!(
            fl.allocate(1),
            Err(AllocError::Failed {
                requested: 1,
                largest_available: 0
            })
        );
    }

    #[test]
    fn zero_size_allocation_rejected() {
        let fl = list(64);
        assert_eq!(fl.allocate(0), Err(AllocError::ZeroSize));
        assert!(fl.try_allocate(0).is_empty());
    }

    #[test]
    fn best_fit_prefers_the_tightest_hole() {
        let fl = list(1000);
        let a = fl.allocate(100).unwrap();
        fl.allocate(10).unwrap();
        let b = fl.allocate(50).unwrap();
        fl.allocate(10).unwrap();
        fl.free(a, 100);
        fl.free(b, 50);
        // Holes of 100, 50 and the 830-byte tail: 40 bytes fits the 50 hole.
        assert_eq!(fl.allocate(40), Ok(b));
    }

    #[test]
    fn largest_range_takes_the_biggest_block() {
        let fl = largest_first(1000);
        let a = fl.allocate(100).unwrap();
        fl.allocate(10).unwrap();
        fl.free(a, 100);
        // Holes: [0,99] and [110,999]; largest-first ignores the snug hole.
        assert_eq!(fl.allocate(40), Ok(Offset(110)));
        assert_eq!(fl.strategy_name(), "largest-range");
        fl.check_consistency().unwrap();
    }

    #[test]
    fn largest_range_reinserts_an_insufficient_candidate() {
        let fl = largest_first(100);
        fl.allocate(60).unwrap();
        assert_eq!(
            fl.allocate(41),
            Err(AllocError::Failed {
                requested: 41,
                largest_available: 40
            })
        );
        assert_eq!(fl.as_range_set(), vec![Range::new(60, 99)]);
        fl.check_consistency().unwrap();
    }

    #[test]
    fn try_allocate_grants_partial_span() {
        let fl = list(100);
        fl.allocate(70).unwrap();
        let span = fl.try_allocate(50);
        assert_eq!(span, Span::new(Offset(70), 30));
        assert_eq!(fl.free_bytes(), 0);
        assert!(fl.try_allocate(1).is_empty());
    }

    #[test]
    fn try_allocate_grants_full_request_when_possible() {
        let fl = list(100);
        assert_eq!(fl.try_allocate(25), Span::new(Offset(0), 25));
        assert_eq!(fl.free_bytes(), 75);
        fl.check_consistency().unwrap();
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn double_free_is_fatal() {
        let fl = list(1000);
        let off = fl.allocate(100).unwrap();
        fl.free(off, 100);
        fl.free(off, 100);
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn partially_overlapping_free_is_fatal() {
        let fl = list(1000);
        fl.allocate(100).unwrap();
        fl.free(Offset(50), 100);
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn free_enclosing_a_free_range_is_fatal() {
        let fl = list(1000);
        fl.allocate(100).unwrap();
        let mid = fl.allocate(100).unwrap();
        fl.allocate(100).unwrap();
        fl.free(mid, 100);
        // [50, 249] swallows the free [100, 199] without either end touching it.
        fl.free(Offset(50), 200);
    }

    #[test]
    #[should_panic(expected = "outside arena")]
    fn free_past_the_end_is_fatal() {
        let fl = list(100);
        fl.allocate(100).unwrap();
        fl.free(Offset(90), 20);
    }

    #[test]
    fn list_survives_a_rejected_double_free() {
        let fl = list(100);
        fl.allocate(10).unwrap();
        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            fl.free(Offset(10), 10);
        }));
        assert!(caught.is_err());
        fl.check_consistency().unwrap();
        assert_eq!(fl.free_bytes(), 90);
    }

    #[test]
    fn extend_grows_the_tail_range() {
        let fl = list(1000);
        fl.allocate(700).unwrap();
        fl.extend(24);
        assert_eq!(fl.capacity(), 1024);
        assert_eq!(fl.as_range_set(), vec![Range::new(700, 1023)]);
        assert_eq!(fl.free_bytes(), 324);
        fl.check_consistency().unwrap();
    }

    #[test]
    fn extend_after_full_tail_adds_new_range() {
        let fl = list(100);
        fl.allocate(10).unwrap();
        fl.allocate(90).unwrap();
        fl.free(Offset(0), 10);
        fl.extend(50);
        assert_eq!(
            fl.as_range_set(),
            vec![Range::new(0, 9), Range::new(100, 149)]
        );
        fl.check_consistency().unwrap();
    }

    #[test]
    fn reset_restores_single_range() {
        let fl = list(1000);
        fl.allocate(10).unwrap();
        fl.allocate(20).unwrap();
        fl.reset(2048);
        assert_eq!(fl.as_range_set(), vec![Range::new(0, 2047)]);
        assert_eq!(fl.free_bytes(), 2048);
        fl.reset(0);
        assert!(fl.as_range_set().is_empty());
        assert_eq!(fl.free_bytes(), 0);
        assert_eq!(fl.capacity(), 0);
        fl.check_consistency().unwrap();
    }

    #[test]
    fn stats_summarise_fragmentation() {
        let fl = list(1000);
        let a = fl.allocate(100).unwrap();
        fl.allocate(100).unwrap();
        fl.free(a, 100);
        let stats = fl.stats();
        assert_eq!(stats.free_bytes, 900);
        assert_eq!(stats.range_count, 2);
        assert_eq!(stats.largest_free, 800);
        assert_eq!(stats.used_bytes(), 100);
    }

    #[test]
    fn sorted_vec_factory_backs_both_indices() {
        let fl = FreeList::with_factory(
            1000,
            ShardBoundaries::from_keys([64, 256]).unwrap(),
            StrategyKind::BestFit.build(),
            &SortedVecFactory,
        );
        let a = fl.allocate(100).unwrap();
        let b = fl.allocate(100).unwrap();
        fl.free(a, 100);
        fl.free(b, 100);
        assert_eq!(fl.as_range_set(), vec![Range::new(0, 999)]);
        fl.check_consistency().unwrap();
    }

    #[test]
    fn size_index_spreads_ranges_across_shards() {
        let fl = FreeList::new(&ArenaConfig::new(8192).with_min_shard_size(64)).unwrap();
        // Leave holes of 10, 100 and 1000 bytes.
        let mut holes = Vec::new();
        for size in [10, 100, 1000] {
            holes.push((fl.allocate(size).unwrap(), size));
            fl.allocate(1).unwrap();
        }
        for (off, size) in holes {
            fl.free(off, size);
        }
        let lens = fl.shard_lens();
        assert_eq!(lens.iter().sum::<usize>(), 4);
        assert!(lens.iter().filter(|&&n| n > 0).count() >= 3);
        fl.check_consistency().unwrap();
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Alloc(u64),
            Free(usize),
        }

        fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
            proptest::collection::vec(
                prop_oneof![
                    (1u64..300).prop_map(Op::Alloc),
                    any::<usize>().prop_map(Op::Free),
                ],
                1..80,
            )
        }

        fn run(fl: &FreeList, ops: &[Op]) -> Result<(), TestCaseError> {
            let capacity = fl.capacity();
            let mut live: Vec<(Offset, u64)> = Vec::new();
            for op in ops {
                match *op {
                    Op::Alloc(size) => {
                        if let Ok(off) = fl.allocate(size) {
                            live.push((off, size));
                        }
                    }
                    Op::Free(pick) => {
                        if !live.is_empty() {
                            let (off, size) = live.swap_remove(pick % live.len());
                            fl.free(off, size);
                        }
                    }
                }
                let used: u64 = live.iter().map(|&(_, s)| s).sum();
                prop_assert_eq!(fl.free_bytes() + used, capacity);
                prop_assert!(fl.check_consistency().is_ok());
            }
            for (off, size) in live.drain(..) {
                fl.free(off, size);
            }
            prop_assert_eq!(fl.as_range_set(), vec![Range::with_len(0, capacity)]);
            Ok(())
        }

        proptest! {
            #[test]
            fn best_fit_conserves_bytes_and_coalesces(ops in arb_ops()) {
                run(&list(4096), &ops)?;
            }

            #[test]
            fn largest_range_conserves_bytes_and_coalesces(ops in arb_ops()) {
                run(&largest_first(4096), &ops)?;
            }

            #[test]
            fn failed_allocation_reports_true_largest(ops in arb_ops(), ask in 1u64..5000) {
                let fl = list(4096);
                let mut live = Vec::new();
                for op in &ops {
                    if let Op::Alloc(size) = *op {
                        if let Ok(off) = fl.allocate(size) {
                            live.push((off, size));
                        }
                    }
                }
                for (i, (off, size)) in live.into_iter().enumerate() {
                    if i % 2 == 0 {
                        fl.free(off, size);
                    }
                }
                let largest = fl.as_range_set().iter().map(Range::size).max().unwrap_or(0);
                match fl.allocate(ask) {
                    Ok(_) => prop_assert!(ask <= largest),
                    Err(AllocError::Failed { largest_available, .. }) => {
                        prop_assert!(ask > largest);
                        prop_assert_eq!(largest_available, largest);
                    }
                    Err(e) => prop_assert!(false, "unexpected error {e}"),
                }
            }
        }
    }
}
