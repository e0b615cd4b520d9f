//! Owning handles to allocated regions.

use std::fmt;
use std::sync::Arc;

use carve_core::{Offset, Span};

use crate::arena::ArenaInner;
use crate::backing::{Backing, HeapBacking};
use crate::error::ArenaError;

/// One reference to an allocated region.
///
/// Cloning adds a reference; dropping releases one. The region returns
/// to the free list when the last handle drops.
pub struct RegionRef<B: Backing = HeapBacking> {
    inner: Arc<ArenaInner<B>>,
    span: Span,
}

impl<B: Backing> RegionRef<B> {
    /// Wrap a span whose reference has already been counted.
    pub(crate) fn new(inner: Arc<ArenaInner<B>>, span: Span) -> Self {
        Self { inner, span }
    }

    /// Offset and length of the region.
    pub fn span(&self) -> Span {
        self.span
    }

    /// First byte of the region.
    pub fn offset(&self) -> Offset {
        self.span.offset
    }

    /// Length in bytes.
    pub fn len(&self) -> u64 {
        self.span.len
    }

    /// Whether the region is zero bytes long. Never true for handles
    /// returned by an arena.
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// Current number of handles to this region.
    pub fn ref_count(&self) -> u64 {
        self.inner.refs.count(self.span.offset)
    }

    /// Absolute offset of `at..at + len` within the region.
    fn absolute(&self, at: u64, len: usize) -> Result<Offset, ArenaError> {
        let len = len as u64;
        match at.checked_add(len) {
            Some(end) if end <= self.span.len => Ok(Offset(self.span.offset.get() + at)),
            _ => Err(ArenaError::OutOfBounds {
                offset: at,
                len,
                limit: self.span.len,
            }),
        }
    }

    /// Copy `buf.len()` bytes from region offset `at`.
    pub fn read(&self, at: u64, buf: &mut [u8]) -> Result<(), ArenaError> {
        let offset = self.absolute(at, buf.len())?;
        self.inner.backing.read(offset, buf)
    }

    /// Copy `data` into the region at offset `at`.
    pub fn write(&self, at: u64, data: &[u8]) -> Result<(), ArenaError> {
        let offset = self.absolute(at, data.len())?;
        self.inner.backing.write(offset, data)
    }
}

impl<B: Backing> Clone for RegionRef<B> {
    fn clone(&self) -> Self {
        self.inner.refs.increment(self.span);
        Self {
            inner: Arc::clone(&self.inner),
            span: self.span,
        }
    }
}

impl<B: Backing> Drop for RegionRef<B> {
    fn drop(&mut self) {
        self.inner.refs.decrement(self.span);
    }
}

impl<B: Backing> fmt::Debug for RegionRef<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionRef").field("span", &self.span).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Arena, ArenaConfig, ArenaError};

    #[test]
    fn clones_share_one_region() {
        let arena = Arena::new(ArenaConfig::new(256)).unwrap();
        let a = arena.allocate(32).unwrap();
        let b = a.clone();
        assert_eq!(a.ref_count(), 2);
        assert_eq!(a.span(), b.span());
        drop(a);
        assert_eq!(b.ref_count(), 1);
        assert_eq!(arena.stats().free_bytes, 224);
        drop(b);
        assert_eq!(arena.stats().free_bytes, 256);
    }

    #[test]
    fn writes_are_visible_through_clones() {
        let arena = Arena::new(ArenaConfig::new(256)).unwrap();
        let a = arena.allocate(8).unwrap();
        let b = a.clone();
        a.write(2, b"xyz").unwrap();
        let mut buf = [0; 3];
        b.read(2, &mut buf).unwrap();
        assert_eq!(&buf, b"xyz");
    }

    #[test]
    fn access_outside_region_rejected() {
        let arena = Arena::new(ArenaConfig::new(256)).unwrap();
        let _before = arena.allocate(8).unwrap();
        let r = arena.allocate(8).unwrap();
        assert_eq!(
            r.write(6, b"abc"),
            Err(ArenaError::OutOfBounds {
                offset: 6,
                len: 3,
                limit: 8
            })
        );
        let mut buf = [0; 1];
        assert!(r.read(u64::MAX, &mut buf).is_err());
        assert!(r.read(7, &mut buf).is_ok());
    }

    #[test]
    fn handle_outlives_the_arena_value() {
        let arena = Arena::new(ArenaConfig::new(64)).unwrap();
        let r = arena.allocate(16).unwrap();
        drop(arena);
        r.write(0, &[1; 16]).unwrap();
        assert_eq!(r.ref_count(), 1);
    }
}
