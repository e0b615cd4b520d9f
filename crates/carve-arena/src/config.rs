//! Arena configuration parameters.

use carve_index::ShardBoundaries;

use crate::error::ArenaError;
use crate::strategy::StrategyKind;

/// Configuration for an [`Arena`](crate::Arena) and its free list.
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Initial arena size in bytes.
    pub capacity: u64,

    /// Upper bound for [`Arena::grow`](crate::Arena::grow), in bytes.
    ///
    /// Default: equal to `capacity` (the arena cannot grow).
    pub max_capacity: u64,

    /// Boundary of the smallest size shard, in bytes.
    ///
    /// Default: 1024. Shard boundaries double from here up to
    /// `max_capacity`, plus one catch-all shard.
    pub min_shard_size: u64,

    /// Block-selection policy used by the free list.
    ///
    /// Default: [`StrategyKind::BestFit`].
    pub strategy: StrategyKind,
}

impl ArenaConfig {
    /// Default smallest shard boundary.
    pub const DEFAULT_MIN_SHARD_SIZE: u64 = 1024;

    /// Default block-selection policy.
    pub const DEFAULT_STRATEGY: StrategyKind = StrategyKind::BestFit;

    /// Create a fixed-size arena config of `capacity` bytes.
    ///
    /// Uses default values for all other parameters.
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            max_capacity: capacity,
            min_shard_size: Self::DEFAULT_MIN_SHARD_SIZE,
            strategy: Self::DEFAULT_STRATEGY,
        }
    }

    /// Use `strategy` for block selection.
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the smallest shard boundary.
    pub fn with_min_shard_size(mut self, min_shard_size: u64) -> Self {
        self.min_shard_size = min_shard_size;
        self
    }

    /// Allow the arena to grow up to `max_capacity` bytes.
    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.min_shard_size == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "min_shard_size must be non-zero".into(),
            });
        }
        if self.max_capacity < self.capacity {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "max_capacity {} is below capacity {}",
                    self.max_capacity, self.capacity
                ),
            });
        }
        Ok(())
    }

    /// Size-shard boundaries for this arena.
    pub fn boundaries(&self) -> Result<ShardBoundaries, ArenaError> {
        Ok(ShardBoundaries::exponential(
            self.min_shard_size,
            self.max_capacity,
        )?)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(0)
    }
}
