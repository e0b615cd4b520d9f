//! Shard boundaries: the fixed partition of the ordering key.
//!
//! Shard `i` owns every item whose [`ShardKey`] is `<= keys[i]` and
//! `> keys[i - 1]`. The last key is always `u64::MAX`, so every item has
//! a home shard.

use std::error::Error;
use std::fmt;

use carve_core::BySize;
use smallvec::SmallVec;

/// Inline capacity for boundary arrays. Exponential size partitioning of
/// any realistic arena stays under this.
const INLINE_SHARDS: usize = 32;

/// Maps an item onto the partition key used to pick its shard.
///
/// Must be monotone with the item's [`Ord`]: `a < b` implies
/// `a.shard_key() <= b.shard_key()`. Otherwise shard-local ordering no
/// longer composes into a global order.
pub trait ShardKey {
    /// The partition key.
    fn shard_key(&self) -> u64;
}

impl ShardKey for BySize {
    fn shard_key(&self) -> u64 {
        self.0.size()
    }
}

impl ShardKey for u64 {
    fn shard_key(&self) -> u64 {
        *self
    }
}

/// Errors from building [`ShardBoundaries`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundaryError {
    /// No boundary keys were supplied.
    Empty,
    /// Keys are not strictly ascending.
    NotAscending {
        /// Index of the first key that is not greater than its predecessor.
        index: usize,
    },
    /// Exponential partitioning needs a non-zero first boundary.
    ZeroMinSize,
}

impl fmt::Display for BoundaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no shard boundaries supplied"),
            Self::NotAscending { index } => {
                write!(f, "shard boundary at index {index} is not strictly ascending")
            }
            Self::ZeroMinSize => write!(f, "minimum shard size must be non-zero"),
        }
    }
}

impl Error for BoundaryError {}

/// Ascending boundary keys, ending in the `u64::MAX` catch-all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardBoundaries {
    keys: SmallVec<[u64; INLINE_SHARDS]>,
}

impl ShardBoundaries {
    /// Exponentially growing boundaries: `min_size, 2·min_size, …` while
    /// below `capacity`, then the catch-all.
    ///
    /// An arena of `capacity` bytes never holds a free range larger than
    /// `capacity`, so boundaries beyond it would only add empty shards.
    pub fn exponential(min_size: u64, capacity: u64) -> Result<Self, BoundaryError> {
        if min_size == 0 {
            return Err(BoundaryError::ZeroMinSize);
        }
        let mut keys = SmallVec::new();
        let mut boundary = min_size;
        while boundary < capacity && boundary < u64::MAX {
            keys.push(boundary);
            boundary = match boundary.checked_mul(2) {
                Some(next) => next,
                None => break,
            };
        }
        keys.push(u64::MAX);
        Ok(Self { keys })
    }

    /// Explicit boundaries. A trailing `u64::MAX` is appended if absent.
    pub fn from_keys<I>(keys: I) -> Result<Self, BoundaryError>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut keys: SmallVec<[u64; INLINE_SHARDS]> = keys.into_iter().collect();
        if keys.is_empty() {
            return Err(BoundaryError::Empty);
        }
        if let Some(index) = keys.windows(2).position(|w| w[0] >= w[1]) {
            return Err(BoundaryError::NotAscending { index: index + 1 });
        }
        if keys.last() != Some(&u64::MAX) {
            keys.push(u64::MAX);
        }
        Ok(Self { keys })
    }

    /// A single catch-all shard: the index degenerates to one locked set.
    pub fn single() -> Self {
        let mut keys = SmallVec::new();
        keys.push(u64::MAX);
        Self { keys }
    }

    /// Index of the shard owning `key`: the first boundary `>= key`,
    /// clamped to the last shard.
    pub fn find_shard(&self, key: u64) -> usize {
        let pos = self.keys.partition_point(|&b| b < key);
        pos.min(self.keys.len() - 1)
    }

    /// Number of shards.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false: there is at least the catch-all shard.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The boundary keys, ascending.
    pub fn keys(&self) -> &[u64] {
        &self.keys
    }
}
