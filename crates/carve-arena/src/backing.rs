//! Byte storage behind an arena.
//!
//! The free list only hands out offsets; a [`Backing`] holds the bytes
//! those offsets address. [`HeapBacking`] is a zero-initialised
//! `Vec<u8>` behind a lock.

use std::sync::{PoisonError, RwLock};

use carve_core::Offset;

use crate::error::ArenaError;

/// Addressable, growable byte storage.
pub trait Backing: Send + Sync {
    /// Current size in bytes.
    fn capacity(&self) -> u64;

    /// Copy `buf.len()` bytes starting at `offset` into `buf`.
    fn read(&self, offset: Offset, buf: &mut [u8]) -> Result<(), ArenaError>;

    /// Copy `data` into storage starting at `offset`.
    fn write(&self, offset: Offset, data: &[u8]) -> Result<(), ArenaError>;

    /// Add `extra` zeroed bytes at the end.
    fn grow(&self, extra: u64) -> Result<(), ArenaError>;
}

/// Heap-allocated backing store.
#[derive(Debug, Default)]
pub struct HeapBacking {
    bytes: RwLock<Vec<u8>>,
}

impl HeapBacking {
    /// Allocate `capacity` zeroed bytes.
    ///
    /// Fails with [`ArenaError::CapacityExceeded`] when `capacity` does
    /// not fit in the address space or the allocation is refused.
    pub fn new(capacity: u64) -> Result<Self, ArenaError> {
        let mut bytes = Vec::new();
        zero_extend(&mut bytes, capacity)?;
        Ok(Self {
            bytes: RwLock::new(bytes),
        })
    }
}

/// Extend `bytes` with zeroes up to `requested` bytes. On failure `bytes`
/// is left as it was.
fn zero_extend(bytes: &mut Vec<u8>, requested: u64) -> Result<(), ArenaError> {
    let exceeded = || ArenaError::CapacityExceeded {
        requested,
        capacity: isize::MAX as u64,
    };
    let new_len = usize::try_from(requested).map_err(|_| exceeded())?;
    let extra = new_len.saturating_sub(bytes.len());
    bytes.try_reserve_exact(extra).map_err(|_| exceeded())?;
    bytes.resize(new_len.max(bytes.len()), 0);
    Ok(())
}

/// Byte range `[offset, offset + len)` as slice indices, or an
/// out-of-bounds error against `limit`.
fn bounds(offset: Offset, len: usize, limit: usize) -> Result<std::ops::Range<usize>, ArenaError> {
    let out_of_bounds = || ArenaError::OutOfBounds {
        offset: offset.get(),
        len: len as u64,
        limit: limit as u64,
    };
    let start = usize::try_from(offset.get()).map_err(|_| out_of_bounds())?;
    let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
    if end > limit {
        return Err(out_of_bounds());
    }
    Ok(start..end)
}

impl Backing for HeapBacking {
    fn capacity(&self) -> u64 {
        self.bytes.read().unwrap_or_else(PoisonError::into_inner).len() as u64
    }

    fn read(&self, offset: Offset, buf: &mut [u8]) -> Result<(), ArenaError> {
        let bytes = self.bytes.read().unwrap_or_else(PoisonError::into_inner);
        let range = bounds(offset, buf.len(), bytes.len())?;
        buf.copy_from_slice(&bytes[range]);
        Ok(())
    }

    fn write(&self, offset: Offset, data: &[u8]) -> Result<(), ArenaError> {
        let mut bytes = self.bytes.write().unwrap_or_else(PoisonError::into_inner);
        let range = bounds(offset, data.len(), bytes.len())?;
        bytes[range].copy_from_slice(data);
        Ok(())
    }

    fn grow(&self, extra: u64) -> Result<(), ArenaError> {
        let mut bytes = self.bytes.write().unwrap_or_else(PoisonError::into_inner);
        let requested = (bytes.len() as u64).saturating_add(extra);
        zero_extend(&mut bytes, requested)
    }
}
