//! Pluggable block-selection policies.
//!
//! An [`ExtractionStrategy`] picks the free range that will satisfy a
//! request and removes it from the free list's indices. The free list
//! then shaves off what it needs and reinserts the remainder, or
//! reinserts the whole candidate when it turns out to be too small.
//!
//! - [`BestFit`]: smallest range of at least the requested size.
//!   Minimises wasted space per allocation; may scan several shards.
//! - [`LargestRange`]: always the largest free range. Candidate lookup is
//!   a single `poll_last`, and it avoids leaving tiny slivers behind, at
//!   the cost of depleting big blocks quickly.

use carve_core::Range;

/// Locked view of the free list's two indices, handed to a strategy for
/// the duration of one extraction.
pub trait FreeRanges {
    /// Smallest free range of at least `size` bytes (size-index ceiling).
    fn ceiling_by_size(&self, size: u64) -> Option<Range>;

    /// Remove and return the largest free range from the size index only.
    fn poll_last_by_size(&mut self) -> Option<Range>;

    /// Remove `range` from the start index only.
    fn remove_by_start(&mut self, range: &Range) -> bool;

    /// Remove `range` from both indices.
    fn take(&mut self, range: &Range) -> bool;
}

/// Policy for choosing which free range satisfies a request.
pub trait ExtractionStrategy: Send + Sync {
    /// Short name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Remove and return a candidate range for a request of `size` bytes.
    ///
    /// The candidate may be smaller than `size`; the free list checks and
    /// reinserts it. `None` means the strategy found no candidate at all.
    fn extract(&self, ranges: &mut dyn FreeRanges, size: u64) -> Option<Range>;
}

/// Smallest free range that fits.
#[derive(Clone, Copy, Debug, Default)]
pub struct BestFit;

impl ExtractionStrategy for BestFit {
    fn name(&self) -> &'static str {
        "best-fit"
    }

    fn extract(&self, ranges: &mut dyn FreeRanges, size: u64) -> Option<Range> {
        let candidate = ranges.ceiling_by_size(size)?;
        ranges.take(&candidate);
        Some(candidate)
    }
}

/// Largest free range, regardless of the requested size.
#[derive(Clone, Copy, Debug, Default)]
pub struct LargestRange;

impl ExtractionStrategy for LargestRange {
    fn name(&self) -> &'static str {
        "largest-range"
    }

    fn extract(&self, ranges: &mut dyn FreeRanges, _size: u64) -> Option<Range> {
        let candidate = ranges.poll_last_by_size()?;
        ranges.remove_by_start(&candidate);
        Some(candidate)
    }
}

/// Configuration-level selector for the built-in strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum StrategyKind {
    /// [`BestFit`].
    #[default]
    BestFit,
    /// [`LargestRange`].
    LargestRange,
}

impl StrategyKind {
    /// Instantiate the strategy.
    pub fn build(self) -> Box<dyn ExtractionStrategy> {
        match self {
            Self::BestFit => Box::new(BestFit),
            Self::LargestRange => Box::new(LargestRange),
        }
    }
}
