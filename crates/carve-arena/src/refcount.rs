//! Reference counts over allocated regions.
//!
//! [`RefCounts`] maps each allocated region's offset to an atomic
//! counter. Increments and decrements run under a shared read lock; the
//! write lock is taken only to create a counter on first use and to
//! retire one when it drops to zero, at which point the region goes back
//! to the [`FreeList`].
//!
//! A counter that reaches zero can be bumped again by a racing increment
//! before the releasing thread takes the write lock. The release then
//! backs off and the region stays allocated.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use carve_core::{Offset, Span};
use carve_index::BTreeFactory;
use indexmap::IndexMap;

use crate::free_list::{invariant_violation, FreeList, RangeSetFactory};

/// Per-region reference counts that free regions on the last release.
pub struct RefCounts<F: RangeSetFactory = BTreeFactory> {
    free_list: Arc<FreeList<F>>,
    counts: RwLock<IndexMap<Offset, AtomicU64>>,
}

// Compile-time assertion: RefCounts must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<RefCounts>();
};

impl<F: RangeSetFactory> RefCounts<F> {
    /// Track references for regions of `free_list`.
    pub fn new(free_list: Arc<FreeList<F>>) -> Self {
        Self {
            free_list,
            counts: RwLock::new(IndexMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<Offset, AtomicU64>> {
        self.counts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<Offset, AtomicU64>> {
        self.counts.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The free list regions are returned to.
    pub fn free_list(&self) -> &Arc<FreeList<F>> {
        &self.free_list
    }

    /// Add a reference to `span` and return the new count.
    ///
    /// The first increment of an offset starts tracking it.
    pub fn increment(&self, span: Span) -> u64 {
        if let Some(count) = self.read().get(&span.offset) {
            return count.fetch_add(1, Ordering::AcqRel) + 1;
        }
        let mut counts = self.write();
        let count = counts
            .entry(span.offset)
            .or_insert_with(|| AtomicU64::new(0));
        let now = count.fetch_add(1, Ordering::AcqRel) + 1;
        log::trace!("ref {span} -> {now}");
        now
    }

    /// Drop a reference to `span` and return the remaining count.
    ///
    /// When the count reaches zero the region is freed.
    ///
    /// # Panics
    ///
    /// Panics if `span` is not tracked or its count is already zero.
    pub fn decrement(&self, span: Span) -> u64 {
        let counts = self.read();
        let Some(count) = counts.get(&span.offset) else {
            drop(counts);
            invariant_violation(format!("decrement of untracked region {span}"));
        };
        let remaining = match count.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
            n.checked_sub(1)
        }) {
            Ok(prev) => prev - 1,
            Err(_) => {
                drop(counts);
                invariant_violation(format!("reference count of {span} would go negative"));
            }
        };
        drop(counts);

        if remaining == 0 {
            self.release(span);
        }
        remaining
    }

    /// Retire the counter of `span` and free the region, unless a racing
    /// increment revived it or a racing release got there first.
    ///
    /// The counter is removed under the write lock, but the free-list call
    /// runs after it is dropped: counts of other regions never wait on the
    /// free list. The region stays allocated until `free` runs.
    fn release(&self, span: Span) {
        let mut counts = self.write();
        match counts.get(&span.offset).map(|c| c.load(Ordering::Acquire)) {
            Some(0) => {
                counts.swap_remove(&span.offset);
            }
            Some(n) => {
                log::warn!("region {span} was re-referenced ({n}) before release");
                return;
            }
            None => {
                log::debug!("region {span} already released");
                return;
            }
        }
        drop(counts);

        self.free_list.free(span.offset, span.len);
        log::trace!("released {span}");
    }

    /// Current count for `offset`; 0 when untracked.
    pub fn count(&self, offset: Offset) -> u64 {
        self.read()
            .get(&offset)
            .map_or(0, |c| c.load(Ordering::Acquire))
    }

    /// Number of tracked regions.
    pub fn tracked(&self) -> usize {
        self.read().len()
    }

    /// Tracked regions and their counts, in first-reference order.
    pub fn snapshot(&self) -> Vec<(Offset, u64)> {
        self.read()
            .iter()
            .map(|(&off, c)| (off, c.load(Ordering::Acquire)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    use carve_core::Range;
    use carve_index::ShardBoundaries;

    use crate::config::ArenaConfig;
    use crate::strategy::{BestFit, ExtractionStrategy, FreeRanges};

    fn refs(capacity: u64) -> RefCounts {
        RefCounts::new(Arc::new(FreeList::new(&ArenaConfig::new(capacity)).unwrap()))
    }

    fn alloc(rc: &RefCounts, size: u64) -> Span {
        Span::new(rc.free_list().allocate(size).unwrap(), size)
    }

    #[test]
    fn first_increment_starts_tracking() {
        let rc = refs(100);
        let span = alloc(&rc, 10);
        assert_eq!(rc.count(span.offset), 0);
        assert_eq!(rc.increment(span), 1);
        assert_eq!(rc.increment(span), 2);
        assert_eq!(rc.tracked(), 1);
        assert_eq!(rc.count(span.offset), 2);
    }

    #[test]
    fn last_decrement_frees_the_region() {
        let rc = refs(100);
        let span = alloc(&rc, 10);
        rc.increment(span);
        rc.increment(span);
        assert_eq!(rc.decrement(span), 1);
        assert_eq!(rc.free_list().free_bytes(), 90);
        assert_eq!(rc.decrement(span), 0);
        assert_eq!(rc.free_list().free_bytes(), 100);
        assert_eq!(rc.tracked(), 0);
        rc.free_list().check_consistency().unwrap();
    }

    #[test]
    fn regions_are_counted_independently() {
        let rc = refs(100);
        let a = alloc(&rc, 10);
        let b = alloc(&rc, 20);
        rc.increment(a);
        rc.increment(b);
        rc.increment(b);
        rc.decrement(a);
        assert_eq!(rc.snapshot(), vec![(b.offset, 2)]);
        assert_eq!(rc.free_list().free_bytes(), 80);
    }

    #[test]
    fn offset_can_be_tracked_again_after_release() {
        let rc = refs(100);
        let span = alloc(&rc, 100);
        rc.increment(span);
        rc.decrement(span);
        let again = alloc(&rc, 100);
        assert_eq!(again, span);
        assert_eq!(rc.increment(again), 1);
    }

    #[test]
    #[should_panic(expected = "untracked region")]
    fn decrement_of_untracked_region_is_fatal() {
        let rc = refs(100);
        let span = alloc(&rc, 10);
        rc.decrement(span);
    }

    #[test]
    #[should_panic(expected = "untracked region")]
    fn decrement_after_release_is_fatal() {
        let rc = refs(100);
        let span = alloc(&rc, 10);
        rc.increment(span);
        rc.decrement(span);
        rc.decrement(span);
    }

    /// Delegates to best-fit, but the first armed extraction parks while
    /// holding the free-list lock until told to continue.
    struct ParkOnce {
        armed: Arc<AtomicBool>,
        parked: Arc<AtomicBool>,
        entered: crossbeam_channel::Sender<()>,
        resume: crossbeam_channel::Receiver<()>,
    }

    impl ExtractionStrategy for ParkOnce {
        fn name(&self) -> &'static str {
            "park-once"
        }

        fn extract(&self, ranges: &mut dyn FreeRanges, size: u64) -> Option<Range> {
            if self.armed.swap(false, Ordering::SeqCst) {
                self.parked.store(true, Ordering::SeqCst);
                self.entered.send(()).unwrap();
                let _ = self.resume.recv_timeout(Duration::from_secs(5));
                self.parked.store(false, Ordering::SeqCst);
            }
            BestFit.extract(ranges, size)
        }
    }

    #[test]
    fn pending_release_does_not_block_other_regions() {
        let armed = Arc::new(AtomicBool::new(false));
        let parked = Arc::new(AtomicBool::new(false));
        let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);
        let (resume_tx, resume_rx) = crossbeam_channel::bounded(1);
        let list = FreeList::with_factory(
            1024,
            ShardBoundaries::single(),
            Box::new(ParkOnce {
                armed: Arc::clone(&armed),
                parked: Arc::clone(&parked),
                entered: entered_tx,
                resume: resume_rx,
            }),
            &BTreeFactory,
        );
        let rc = RefCounts::new(Arc::new(list));
        let x = alloc(&rc, 64);
        let y = alloc(&rc, 64);
        rc.increment(x);
        rc.increment(y);
        armed.store(true, Ordering::SeqCst);

        thread::scope(|s| {
            let rc = &rc;
            // Holds the free-list lock until resumed.
            s.spawn(move || rc.free_list().allocate(8).unwrap());
            entered_rx.recv().unwrap();

            // Terminal release of x: retires the counter, then waits on the free list.
            s.spawn(move || rc.decrement(x));
            while rc.tracked() != 1 {
                thread::yield_now();
            }

            assert_eq!(rc.increment(y), 2);
            assert_eq!(rc.decrement(y), 1);
            assert!(
                parked.load(Ordering::SeqCst),
                "count update on y waited for the free list"
            );
            resume_tx.send(()).unwrap();
        });

        assert_eq!(rc.count(x.offset), 0);
        assert_eq!(rc.count(y.offset), 1);
        assert_eq!(rc.free_list().free_bytes(), 1024 - 64 - 8);
        rc.free_list().check_consistency().unwrap();
    }
}
