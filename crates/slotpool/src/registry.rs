//! Size-class directory routing requests to fixed-size pools.
//!
//! The registry owns one [`Pool`] per size class: 64 classes at an 8-byte
//! granularity, covering request sizes 1 through 512. A request is rounded
//! up to the next multiple of 8 and served by the matching pool; requests
//! above [`MAX_POOLED_SIZE`] bypass the pools and go straight to the global
//! allocator with a fixed fallback alignment.
//!
//! The pool array is immutable after construction, so routing touches no
//! shared mutable state and every pool synchronizes independently.

use std::alloc::{Layout, alloc, dealloc};
use std::ptr::NonNull;
use std::sync::OnceLock;

use crate::error::{AllocError, AllocResult};
use crate::pool::Pool;

/// Number of distinct size classes.
pub const SIZE_CLASS_COUNT: usize = 64;

/// Spacing between adjacent size classes, in bytes.
pub const SLOT_GRANULARITY: usize = 8;

/// Largest request served from a pool; larger requests hit the global
/// allocator directly.
pub const MAX_POOLED_SIZE: usize = SIZE_CLASS_COUNT * SLOT_GRANULARITY;

/// Alignment applied to oversize requests routed to the global allocator.
const FALLBACK_ALIGN: usize = 16;

/// Fixed directory of size-class pools.
///
/// Construction fully initializes all pools before the registry is usable;
/// there is no lazy per-pool setup and no registration race. Blocks are
/// still acquired lazily inside each pool on first demand.
pub struct SizeClassRegistry {
    pools: [Pool; SIZE_CLASS_COUNT],
}

impl SizeClassRegistry {
    /// Creates a registry with 64 pools using the default block size.
    pub fn new() -> Self {
        let pools = core::array::from_fn(|class| {
            match Pool::new((class + 1) * SLOT_GRANULARITY) {
                Ok(pool) => pool,
                // Class sizes are 8..=512 against a 4096-byte block; the
                // validation in Pool::with_block_size cannot reject them.
                Err(_) => unreachable!("default size classes are always valid"),
            }
        });
        Self { pools }
    }

    /// Creates a registry whose pools all carve `block_size`-byte blocks.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::InvalidConfig`] when `block_size` is too small
    /// for the largest size class.
    pub fn with_block_size(block_size: usize) -> AllocResult<Self> {
        let mut pools = Vec::with_capacity(SIZE_CLASS_COUNT);
        for class in 0..SIZE_CLASS_COUNT {
            pools.push(Pool::with_block_size(
                (class + 1) * SLOT_GRANULARITY,
                block_size,
            )?);
        }
        let Ok(pools) = <[Pool; SIZE_CLASS_COUNT]>::try_from(pools) else {
            unreachable!("pool vector has exactly SIZE_CLASS_COUNT entries");
        };
        Ok(Self { pools })
    }

    /// Shared process-wide registry, initialized on first use.
    pub fn global() -> &'static SizeClassRegistry {
        static GLOBAL: OnceLock<SizeClassRegistry> = OnceLock::new();
        GLOBAL.get_or_init(SizeClassRegistry::new)
    }

    /// Maps a request size to its size-class index.
    ///
    /// Returns `None` for zero and for sizes above [`MAX_POOLED_SIZE`].
    pub fn class_index(size: usize) -> Option<usize> {
        if size == 0 || size > MAX_POOLED_SIZE {
            return None;
        }
        Some((size + SLOT_GRANULARITY - 1) / SLOT_GRANULARITY - 1)
    }

    /// Borrows the pool serving size class `class`.
    ///
    /// # Panics
    ///
    /// Panics if `class >= SIZE_CLASS_COUNT`.
    pub fn pool(&self, class: usize) -> &Pool {
        &self.pools[class]
    }

    /// Requests `size` bytes of uninitialized memory.
    ///
    /// Sizes within [`MAX_POOLED_SIZE`] round up to their size class and
    /// come from the matching pool; larger sizes come from the global
    /// allocator at a 16-byte alignment. A zero-size request yields
    /// `Ok(None)` without touching any pool.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::OutOfMemory`] when the backing allocation
    /// fails, for pooled and oversize requests alike.
    pub fn request(&self, size: usize) -> AllocResult<Option<NonNull<u8>>> {
        match Self::class_index(size) {
            Some(class) => self.pools[class].allocate().map(Some),
            None if size > MAX_POOLED_SIZE => {
                let layout = Layout::from_size_align(size, FALLBACK_ALIGN)
                    .map_err(|_| AllocError::out_of_memory(size))?;
                // SAFETY: `layout` has non-zero size.
                let raw = unsafe { alloc(layout) };
                let ptr = NonNull::new(raw).ok_or(AllocError::out_of_memory(size))?;
                #[cfg(feature = "logging")]
                tracing::trace!(size, "oversize request served by the global allocator");
                Ok(Some(ptr))
            }
            None => Ok(None),
        }
    }

    /// Releases memory obtained from [`request`](Self::request).
    ///
    /// Routing mirrors the request path, so `size` must be the size passed
    /// at allocation time. `None` pointers and zero sizes are absorbed
    /// silently.
    ///
    /// # Safety
    ///
    /// `ptr` must come from a `request(size)` call on this registry with
    /// the same `size`, must not be in use, and must not be released twice.
    pub unsafe fn release(&self, ptr: Option<NonNull<u8>>, size: usize) {
        let Some(ptr) = ptr else { return };
        if size == 0 {
            return;
        }
        match Self::class_index(size) {
            // SAFETY: the caller guarantees `ptr` came from this size, so
            // routing lands on the pool that allocated it.
            Some(class) => unsafe { self.pools[class].deallocate(ptr) },
            None => {
                // Oversize path; same layout as the matching request.
                // The layout was valid at allocation time.
                if let Ok(layout) = Layout::from_size_align(size, FALLBACK_ALIGN) {
                    // SAFETY: caller contract, allocation used this layout.
                    unsafe { dealloc(ptr.as_ptr(), layout) };
                }
            }
        }
    }
}

impl Default for SizeClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SizeClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizeClassRegistry")
            .field("size_classes", &SIZE_CLASS_COUNT)
            .field("granularity", &SLOT_GRANULARITY)
            .field("max_pooled_size", &MAX_POOLED_SIZE)
            .finish()
    }
}
