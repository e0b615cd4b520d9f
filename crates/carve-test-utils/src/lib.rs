//! Test fixtures and invariant checks for Carve development.
//!
//! - [`LiveSet`]: ledger of regions a test currently holds.
//! - [`assert_free_ranges_sound`]: full invariant check of a
//!   [`FreeList`] against a [`LiveSet`].
//! - [`workload`]: deterministic, seeded allocate/free sequences.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod workload;

use carve_arena::{FreeList, RangeSetFactory};
use carve_core::{Offset, Range, Span};

pub use workload::{run_ops, Op, OpStream, RunSummary};

/// Regions a test holds, with their total size.
#[derive(Clone, Debug, Default)]
pub struct LiveSet {
    regions: Vec<Span>,
    bytes: u64,
}

impl LiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, span: Span) {
        self.bytes += span.len;
        self.regions.push(span);
    }

    /// Remove the region at `pick % len`; `None` when empty.
    pub fn take(&mut self, pick: usize) -> Option<Span> {
        if self.regions.is_empty() {
            return None;
        }
        let span = self.regions.swap_remove(pick % self.regions.len());
        self.bytes -= span.len;
        Some(span)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Total bytes held.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn regions(&self) -> &[Span] {
        &self.regions
    }

    /// Give every region back to `list`.
    pub fn release_all<F: RangeSetFactory>(&mut self, list: &FreeList<F>) {
        for span in self.regions.drain(..) {
            list.free(span.offset, span.len);
        }
        self.bytes = 0;
    }
}

fn as_range(span: Span) -> Range {
    Range::with_len(span.offset.get(), span.len)
}

/// Check every free-list invariant plus agreement with `live`:
/// bytes are conserved and no held region overlaps a free range.
///
/// # Panics
///
/// Panics with a description of the first violation found.
pub fn assert_free_ranges_sound<F: RangeSetFactory>(list: &FreeList<F>, live: &LiveSet) {
    if let Err(e) = list.check_consistency() {
        panic!("free list inconsistent: {e}");
    }
    assert_eq!(
        list.free_bytes() + live.bytes(),
        list.capacity(),
        "free ({}) + live ({}) != capacity",
        list.free_bytes(),
        live.bytes()
    );

    let free = list.as_range_set();
    let mut held: Vec<Range> = live.regions().iter().map(|&s| as_range(s)).collect();
    held.sort();
    for pair in held.windows(2) {
        assert!(
            !pair[0].overlaps(&pair[1]),
            "live regions {} and {} overlap",
            pair[0],
            pair[1]
        );
    }
    for region in &held {
        // Only the free range at or before the region's start can reach into it.
        let idx = free.partition_point(|r| r.lower() <= region.lower());
        for r in free[idx.saturating_sub(1)..].iter().take(2) {
            assert!(
                !r.overlaps(region),
                "live region {region} overlaps free range {r}"
            );
        }
    }
}

/// Span helper for tests that build regions by hand.
pub fn span(offset: u64, len: u64) -> Span {
    Span::new(Offset(offset), len)
}
