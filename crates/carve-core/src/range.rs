//! Closed integer intervals over arena offsets.
//!
//! A [`Range`] is the elementary unit of free-space tracking: the free
//! list stores free space as a set of non-overlapping, non-adjacent
//! ranges. Ranges are immutable values; every transformation returns a
//! new range.
//!
//! Two orderings are used:
//!
//! - **Start order** ([`Ord`] on [`Range`]): by lower bound, then length.
//! - **Size order** ([`Ord`] on [`BySize`]): by size, then lower bound.

use std::cmp::Ordering;
use std::fmt;

use crate::error::RangeError;
use crate::id::{Offset, Span};

/// Closed interval `[lower, upper]` over `u64` offsets.
///
/// Stored as `(lower, len)` so that the empty sentinel (`len == 0`) has
/// a natural representation: it marks a location without covering any
/// bytes, and reports `upper() == lower()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Range {
    lower: u64,
    len: u64,
}

impl Range {
    /// Create `[lower, upper]`.
    ///
    /// # Panics
    ///
    /// Panics if `lower > upper`, or if the interval covers the whole
    /// `u64` domain (its size would not be representable).
    pub fn new(lower: u64, upper: u64) -> Self {
        match Self::try_new(lower, upper) {
            Ok(range) => range,
            Err(e) => panic!("invalid range [{lower}, {upper}]: {e}"),
        }
    }

    /// Fallible form of [`Range::new`].
    pub fn try_new(lower: u64, upper: u64) -> Result<Self, RangeError> {
        if lower > upper {
            return Err(RangeError::Inverted { lower, upper });
        }
        let len = (upper - lower)
            .checked_add(1)
            .ok_or(RangeError::Overflow { lower, upper })?;
        Ok(Self { lower, len })
    }

    /// Create the range of `len` bytes starting at `lower`.
    ///
    /// # Panics
    ///
    /// Panics if `len == 0` (use [`Range::empty`]) or if the last byte
    /// would lie past `u64::MAX`.
    pub fn with_len(lower: u64, len: u64) -> Self {
        assert!(len > 0, "Range::with_len requires len > 0, use Range::empty");
        assert!(
            lower.checked_add(len - 1).is_some(),
            "range of {len} bytes at {lower} overflows u64"
        );
        Self { lower, len }
    }

    /// Zero-size range anchored at `location`.
    pub fn empty(location: u64) -> Self {
        Self {
            lower: location,
            len: 0,
        }
    }

    /// Lower bound (inclusive).
    pub fn lower(&self) -> u64 {
        self.lower
    }

    /// Upper bound (inclusive). Equal to `lower()` for the empty range.
    pub fn upper(&self) -> u64 {
        if self.len == 0 {
            self.lower
        } else {
            self.lower + (self.len - 1)
        }
    }

    /// Number of offsets covered: `upper - lower + 1`, or 0 when empty.
    pub fn size(&self) -> u64 {
        self.len
    }

    /// Whether this is the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The range as a granted [`Span`].
    pub fn as_span(&self) -> Span {
        Span::new(Offset(self.lower), self.len)
    }

    /// Drop the first `offset` bytes.
    ///
    /// Returns `[lower + offset, upper]`, or the empty range anchored at
    /// `lower + offset` when `offset == size()`. Shaving an empty range
    /// returns it unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `offset > size()`.
    #[must_use]
    pub fn shave(&self, offset: u64) -> Self {
        if self.is_empty() {
            return *self;
        }
        assert!(
            offset <= self.len,
            "cannot shave {offset} bytes from {self} of size {}",
            self.len
        );
        Self {
            lower: self.lower + offset,
            len: self.len - offset,
        }
    }

    /// Whether `x` lies inside the range. Always false when empty.
    pub fn contains(&self, x: u64) -> bool {
        !self.is_empty() && self.lower <= x && x <= self.upper()
    }

    /// Whether the two ranges share at least one offset.
    pub fn overlaps(&self, other: &Range) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.lower <= other.upper()
            && other.lower <= self.upper()
    }

    /// Whether one range ends exactly one offset before the other begins.
    pub fn is_adjacent_to(&self, other: &Range) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.upper().checked_add(1) == Some(other.lower)
            || other.upper().checked_add(1) == Some(self.lower)
    }

    /// Smallest range covering both `self` and `other`.
    ///
    /// Unchecked: the result is only meaningful when the two ranges
    /// overlap or are adjacent, which the caller must establish first.
    /// See [`Range::checked_span`] for the guarded form.
    #[must_use]
    pub fn span(&self, other: &Range) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let lower = self.lower.min(other.lower);
        let upper = self.upper().max(other.upper());
        Self::new(lower, upper)
    }

    /// [`Range::span`], or `None` if the ranges neither overlap nor touch.
    pub fn checked_span(&self, other: &Range) -> Option<Self> {
        if self.overlaps(other) || self.is_adjacent_to(other) {
            Some(self.span(other))
        } else {
            None
        }
    }

    /// Grow the upper bound by `amount`: `[lower, upper + amount]`.
    ///
    /// # Panics
    ///
    /// Panics if the new upper bound overflows `u64`.
    #[must_use]
    pub fn extend(&self, amount: u64) -> Self {
        let len = self
            .len
            .checked_add(amount)
            .filter(|len| *len == 0 || self.lower.checked_add(len - 1).is_some())
            .unwrap_or_else(|| panic!("extending {self} by {amount} overflows u64"));
        Self {
            lower: self.lower,
            len,
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "[{}, -]", self.lower)
        } else {
            write!(f, "[{}, {}]", self.lower, self.upper())
        }
    }
}

/// A [`Range`] ordered by size, ties broken by lower bound.
///
/// This is the comparator for the size index: the smallest range that is
/// at least `n` bytes is the ceiling of `BySize::probe(n)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BySize(pub Range);

impl BySize {
    /// A key-only probe that sorts before every range of size `size`.
    pub fn probe(size: u64) -> Self {
        Self(Range { lower: 0, len: size })
    }

    /// The wrapped range.
    pub fn range(&self) -> Range {
        self.0
    }
}

impl Ord for BySize {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .size()
            .cmp(&other.0.size())
            .then(self.0.lower.cmp(&other.0.lower))
    }
}

impl PartialOrd for BySize {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Range> for BySize {
    fn from(range: Range) -> Self {
        Self(range)
    }
}
