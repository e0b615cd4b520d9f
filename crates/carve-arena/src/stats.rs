//! Point-in-time free-list statistics.

/// Summary of a free list, captured under one lock acquisition.
///
/// Consumers (telemetry, benchmarks, fragmentation tests) read these to
/// judge how well the extraction strategy is holding up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FreeListStats {
    /// Total free bytes.
    pub free_bytes: u64,
    /// Arena size in bytes.
    pub capacity: u64,
    /// Number of disjoint free ranges.
    pub range_count: usize,
    /// Size of the largest free range, in bytes.
    pub largest_free: u64,
}

impl FreeListStats {
    /// Bytes currently handed out.
    pub fn used_bytes(&self) -> u64 {
        self.capacity - self.free_bytes
    }

    /// External fragmentation in `[0.0, 1.0]`.
    ///
    /// `1 - largest_free / free_bytes`: zero when all free space is one
    /// range (or nothing is free), approaching one as free space splinters.
    pub fn fragmentation(&self) -> f64 {
        if self.free_bytes == 0 {
            return 0.0;
        }
        1.0 - self.largest_free as f64 / self.free_bytes as f64
    }
}
