//! Error types shared across the Carve workspace.
//!
//! Only recoverable conditions are modelled here. Invariant violations
//! (double free, negative reference counts, corrupt ranges) are bugs in
//! the caller and panic instead of returning an error.

use std::error::Error;
use std::fmt;

/// Errors from constructing a [`Range`](crate::Range).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeError {
    /// The lower bound is greater than the upper bound.
    Inverted {
        /// Requested lower bound.
        lower: u64,
        /// Requested upper bound.
        upper: u64,
    },
    /// The range's size does not fit in a `u64`.
    Overflow {
        /// Requested lower bound.
        lower: u64,
        /// Requested upper bound.
        upper: u64,
    },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inverted { lower, upper } => {
                write!(f, "lower bound {lower} exceeds upper bound {upper}")
            }
            Self::Overflow { lower, upper } => {
                write!(f, "size of [{lower}, {upper}] overflows u64")
            }
        }
    }
}

impl Error for RangeError {}

/// Errors from requesting space from a free list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// A zero-byte allocation was requested.
    ZeroSize,
    /// No free range is large enough to satisfy the request.
    ///
    /// Recoverable: callers are expected to fall back to another arena
    /// or propagate the failure.
    Failed {
        /// Number of bytes requested.
        requested: u64,
        /// Size of the largest free range at the time of the request.
        largest_available: u64,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSize => write!(f, "zero-size allocation requested"),
            Self::Failed {
                requested,
                largest_available,
            } => {
                write!(
                    f,
                    "failed allocation: requested {requested} bytes, largest available {largest_available} bytes"
                )
            }
        }
    }
}

impl Error for AllocError {}
