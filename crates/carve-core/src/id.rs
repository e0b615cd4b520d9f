//! Strongly-typed arena offsets and granted spans.

use std::fmt;

/// A byte offset inside an arena.
///
/// Offsets are opaque at the API boundary: the allocator hands them out
/// and takes them back, and only the backing region turns them into
/// positions in real storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Offset(pub u64);

impl Offset {
    /// The offset as a raw integer.
    pub fn get(self) -> u64 {
        self.0
    }

    /// `self + len`, or `None` on overflow.
    ///
    /// Used by backing regions for bounds checks.
    pub fn checked_add(self, len: u64) -> Option<Offset> {
        self.0.checked_add(len).map(Offset)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for Offset {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// The offset and byte length granted by an allocation.
///
/// Under partial-allocation semantics the length may be smaller than the
/// requested size. An empty span (`len == 0`) means nothing was granted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct Span {
    /// First byte of the span.
    pub offset: Offset,
    /// Number of bytes in the span.
    pub len: u64,
}

impl Span {
    /// Create a span of `len` bytes starting at `offset`.
    pub fn new(offset: Offset, len: u64) -> Self {
        Self { offset, len }
    }

    /// The span that grants nothing.
    pub fn empty() -> Self {
        Self {
            offset: Offset(0),
            len: 0,
        }
    }

    /// Whether this span grants zero bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exclusive end offset, or `None` if it would overflow `u64`.
    pub fn end(&self) -> Option<Offset> {
        self.offset.checked_add(self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span(off={}, len={})", self.offset, self.len)
    }
}
