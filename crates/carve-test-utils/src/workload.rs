//! Deterministic allocate/free workloads.
//!
//! An [`OpStream`] is a seeded generator of [`Op`]s; the same seed always
//! yields the same sequence, so a failing churn test can be replayed.

use carve_arena::{FreeList, RangeSetFactory};
use carve_core::Span;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::LiveSet;

/// One step of a workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Allocate this many bytes.
    Alloc(u64),
    /// Free the live region at `pick % live.len()`.
    Free(usize),
}

/// Seeded generator of allocation workloads.
pub struct OpStream {
    rng: ChaCha8Rng,
    min_size: u64,
    max_size: u64,
    free_ratio: f64,
}

impl OpStream {
    /// Sizes uniform in `1..=max_size`, half the ops frees.
    pub fn new(seed: u64, max_size: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            min_size: 1,
            max_size: max_size.max(1),
            free_ratio: 0.5,
        }
    }

    /// Draw sizes from `min_size..=max_size` instead.
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size.clamp(1, self.max_size);
        self
    }

    /// Fraction of ops that are frees, clamped to `[0, 1]`.
    pub fn with_free_ratio(mut self, ratio: f64) -> Self {
        self.free_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn next_op(&mut self) -> Op {
        if self.rng.random_bool(self.free_ratio) {
            Op::Free(self.rng.random_range(0..usize::MAX))
        } else {
            Op::Alloc(self.rng.random_range(self.min_size..=self.max_size))
        }
    }

    /// The next `n` ops.
    pub fn ops(&mut self, n: usize) -> Vec<Op> {
        (0..n).map(|_| self.next_op()).collect()
    }
}

impl Iterator for OpStream {
    type Item = Op;

    fn next(&mut self) -> Option<Op> {
        Some(self.next_op())
    }
}

/// Outcome counts of [`run_ops`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub allocated: usize,
    pub failed: usize,
    pub freed: usize,
}

/// Apply `ops` to `list`, recording held regions in `live`.
///
/// Failed allocations are counted, not treated as errors. Frees against
/// an empty ledger are skipped.
pub fn run_ops<F, I>(list: &FreeList<F>, ops: I, live: &mut LiveSet) -> RunSummary
where
    F: RangeSetFactory,
    I: IntoIterator<Item = Op>,
{
    let mut summary = RunSummary::default();
    for op in ops {
        match op {
            Op::Alloc(size) => match list.allocate(size) {
                Ok(offset) => {
                    live.push(Span::new(offset, size));
                    summary.allocated += 1;
                }
                Err(_) => summary.failed += 1,
            },
            Op::Free(pick) => {
                if let Some(span) = live.take(pick) {
                    list.free(span.offset, span.len);
                    summary.freed += 1;
                }
            }
        }
    }
    summary
}
