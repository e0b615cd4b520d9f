//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use carve_core::{AllocError, Range};
use carve_index::BoundaryError;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The free list could not satisfy an allocation.
    Alloc(AllocError),
    /// A read or write fell outside the addressed region.
    OutOfBounds {
        /// First byte of the access.
        offset: u64,
        /// Length of the access in bytes.
        len: u64,
        /// Exclusive bound the access had to stay within.
        limit: u64,
    },
    /// Growing the arena would exceed its configured maximum.
    CapacityExceeded {
        /// Capacity in bytes that was requested.
        requested: u64,
        /// Maximum capacity in bytes.
        capacity: u64,
    },
    /// The arena cannot be reset while regions are still referenced.
    LiveReferences {
        /// Number of regions with a non-zero reference count.
        count: usize,
    },
    /// The arena configuration is invalid.
    InvalidConfig {
        /// Description of which invariant was violated.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc(e) => write!(f, "{e}"),
            Self::OutOfBounds { offset, len, limit } => {
                write!(
                    f,
                    "access of {len} bytes at offset {offset} exceeds bound {limit}"
                )
            }
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, maximum {capacity} bytes"
                )
            }
            Self::LiveReferences { count } => {
                write!(f, "{count} regions are still referenced")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
        }
    }
}

impl Error for ArenaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Alloc(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AllocError> for ArenaError {
    fn from(e: AllocError) -> Self {
        Self::Alloc(e)
    }
}

impl From<BoundaryError> for ArenaError {
    fn from(e: BoundaryError) -> Self {
        Self::InvalidConfig {
            reason: e.to_string(),
        }
    }
}

/// A broken free-list invariant found by
/// [`FreeList::check_consistency`](crate::FreeList::check_consistency).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsistencyError {
    /// The start index and the size index hold different ranges.
    IndexMismatch {
        /// Ranges in the start index.
        by_start: Vec<Range>,
        /// Ranges in the size index, sorted by start.
        by_size: Vec<Range>,
    },
    /// Two free ranges share an offset.
    Overlap {
        /// Lower of the two ranges.
        first: Range,
        /// Higher of the two ranges.
        second: Range,
    },
    /// Two free ranges touch and should have been merged.
    Adjacent {
        /// Lower of the two ranges.
        first: Range,
        /// Higher of the two ranges.
        second: Range,
    },
    /// The cached free-byte count disagrees with the ranges.
    SizeMismatch {
        /// The cached count.
        cached: u64,
        /// The sum of the free ranges.
        actual: u64,
    },
    /// A free range lies past the arena's end.
    OutOfArena {
        /// The offending range.
        range: Range,
        /// Arena capacity in bytes.
        capacity: u64,
    },
}

impl fmt::Display for ConsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexMismatch { by_start, by_size } => {
                write!(
                    f,
                    "index mismatch: {} ranges by start, {} by size",
                    by_start.len(),
                    by_size.len()
                )
            }
            Self::Overlap { first, second } => {
                write!(f, "free ranges {first} and {second} overlap")
            }
            Self::Adjacent { first, second } => {
                write!(f, "free ranges {first} and {second} are adjacent but unmerged")
            }
            Self::SizeMismatch { cached, actual } => {
                write!(f, "cached free size {cached} differs from actual {actual}")
            }
            Self::OutOfArena { range, capacity } => {
                write!(f, "free range {range} lies outside arena of {capacity} bytes")
            }
        }
    }
}

impl Error for ConsistencyError {}
