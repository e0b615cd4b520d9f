//! The arena facade: free list, reference counts and backing bytes.

use std::sync::{Arc, Mutex, PoisonError};

use carve_core::{Offset, Span};

use crate::backing::{Backing, HeapBacking};
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::free_list::FreeList;
use crate::handle::RegionRef;
use crate::refcount::RefCounts;
use crate::stats::FreeListStats;

/// State shared by an [`Arena`] and every [`RegionRef`] it hands out.
pub(crate) struct ArenaInner<B> {
    pub(crate) config: ArenaConfig,
    pub(crate) backing: B,
    pub(crate) refs: RefCounts,
    /// Serialises `grow` so backing and free list extend in lockstep.
    resize: Mutex<()>,
}

/// A fixed-capacity (optionally growable) byte arena.
///
/// Allocations return [`RegionRef`] handles that keep their region alive;
/// the region returns to the free list when the last handle drops.
///
/// # Example
///
/// ```
/// use carve_arena::{Arena, ArenaConfig};
///
/// let arena = Arena::new(ArenaConfig::new(1024)).unwrap();
/// let region = arena.allocate(100).unwrap();
/// region.write(0, b"hello").unwrap();
/// assert_eq!(arena.stats().free_bytes, 924);
/// drop(region);
/// assert_eq!(arena.stats().free_bytes, 1024);
/// ```
pub struct Arena<B: Backing = HeapBacking> {
    inner: Arc<ArenaInner<B>>,
}

// Compile-time assertion: Arena must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Arena>();
    assert::<RegionRef>();
};

impl Arena<HeapBacking> {
    /// Create a heap-backed arena from `config`.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        let backing = HeapBacking::new(config.capacity)?;
        Self::with_backing(config, backing)
    }
}

impl<B: Backing> Arena<B> {
    /// Create an arena over caller-supplied storage.
    ///
    /// `backing` must hold at least `config.capacity` bytes.
    pub fn with_backing(config: ArenaConfig, backing: B) -> Result<Self, ArenaError> {
        if backing.capacity() < config.capacity {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "backing holds {} bytes, arena needs {}",
                    backing.capacity(),
                    config.capacity
                ),
            });
        }
        let free_list = Arc::new(FreeList::new(&config)?);
        log::debug!(
            "arena created: capacity={}, max_capacity={}, strategy={}",
            config.capacity,
            config.max_capacity,
            free_list.strategy_name()
        );
        Ok(Self {
            inner: Arc::new(ArenaInner {
                config,
                backing,
                refs: RefCounts::new(free_list),
                resize: Mutex::new(()),
            }),
        })
    }

    fn region(&self, span: Span) -> RegionRef<B> {
        self.inner.refs.increment(span);
        RegionRef::new(Arc::clone(&self.inner), span)
    }

    /// Allocate exactly `size` bytes.
    pub fn allocate(&self, size: u64) -> Result<RegionRef<B>, ArenaError> {
        let offset = self.free_list().allocate(size)?;
        Ok(self.region(Span::new(offset, size)))
    }

    /// Allocate up to `size` bytes, or `None` if nothing is free.
    ///
    /// The returned region may be shorter than `size`; check
    /// [`RegionRef::len`].
    pub fn try_allocate(&self, size: u64) -> Option<RegionRef<B>> {
        let span = self.free_list().try_allocate(size);
        (!span.is_empty()).then(|| self.region(span))
    }

    /// Grow the arena by `extra` bytes.
    ///
    /// Fails with [`ArenaError::CapacityExceeded`] past
    /// [`ArenaConfig::max_capacity`].
    pub fn grow(&self, extra: u64) -> Result<(), ArenaError> {
        let _resize = self
            .inner
            .resize
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let current = self.free_list().capacity();
        let requested = current.saturating_add(extra);
        if requested > self.inner.config.max_capacity {
            return Err(ArenaError::CapacityExceeded {
                requested,
                capacity: self.inner.config.max_capacity,
            });
        }
        if extra == 0 {
            return Ok(());
        }
        // Backing first, so every offset the free list can hand out is addressable.
        if self.inner.backing.capacity() < requested {
            self.inner
                .backing
                .grow(requested - self.inner.backing.capacity())?;
        }
        self.free_list().extend(extra);
        Ok(())
    }

    /// Return every byte to the free list.
    ///
    /// The arena keeps its current capacity, including any growth since
    /// construction.
    ///
    /// Fails with [`ArenaError::LiveReferences`] while any region is
    /// still referenced.
    pub fn reset(&mut self) -> Result<(), ArenaError> {
        let live = self.inner.refs.tracked();
        if live > 0 {
            return Err(ArenaError::LiveReferences { count: live });
        }
        let capacity = self.free_list().capacity();
        self.free_list().reset(capacity);
        Ok(())
    }

    /// Copy bytes at an absolute arena offset.
    pub fn read_at(&self, offset: Offset, buf: &mut [u8]) -> Result<(), ArenaError> {
        self.inner.backing.read(offset, buf)
    }

    /// The free list.
    pub fn free_list(&self) -> &FreeList {
        self.inner.refs.free_list()
    }

    /// The reference counts of live regions.
    pub fn ref_counts(&self) -> &RefCounts {
        &self.inner.refs
    }

    /// Free-list statistics.
    pub fn stats(&self) -> FreeListStats {
        self.free_list().stats()
    }

    /// The configuration this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.inner.config
    }

    /// Current arena size in bytes.
    pub fn capacity(&self) -> u64 {
        self.free_list().capacity()
    }
}
