//! A single-size-class arena pool.
//!
//! Each [`Pool`] serves exactly one slot size. Slots come from two places:
//! a lock-free free list of previously released slots (the fast path), and
//! a bump cursor over the newest block obtained from the global allocator
//! (the slow path, guarded by a short per-pool mutex).
//!
//! Blocks are never returned to the system while the pool lives; they are
//! owned by the pool and freed together when it is dropped. Memory carved
//! for abandoned bump remainders in older blocks is not reclaimed, it is
//! accepted slack bounded by one slot per block.
//!
//! The free list carries no version tags, so an interleaving where a slot
//! is popped, reused and re-pushed while another pop holds its stale link
//! can corrupt the list (the classic ABA problem). Addresses never leave
//! the pool before teardown, which narrows but does not close the window;
//! workloads with pathological same-slot churn across many threads should
//! be aware of it.

use std::alloc::{Layout, alloc, dealloc};
use std::ptr::NonNull;

use parking_lot::Mutex;

use crate::error::{AllocError, AllocResult};
use crate::free_list::FreeList;
use crate::utils::pad_to_stride;

/// Default number of bytes requested from the global allocator per block.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// One block of backing memory owned by a pool.
///
/// Deallocated with its exact allocation layout when the pool drops.
struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Block {
    fn alloc(size: usize) -> AllocResult<Self> {
        let layout = Layout::from_size_align(size, align_of::<usize>())
            .map_err(|_| AllocError::out_of_memory(size))?;
        // SAFETY: `layout` has non-zero size, enforced by pool validation.
        let raw = unsafe { alloc(layout) };
        match NonNull::new(raw) {
            Some(ptr) => Ok(Self { ptr, layout }),
            None => Err(AllocError::out_of_memory(size)),
        }
    }

    fn base(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    fn len(&self) -> usize {
        self.layout.size()
    }

    fn contains(&self, addr: usize) -> bool {
        addr >= self.base() && addr < self.base() + self.len()
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        // SAFETY: `ptr` was obtained from `alloc` with exactly `layout`.
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

/// Carving state behind the pool mutex.
///
/// `cursor` and `limit` are absolute byte addresses into the newest block.
/// `cursor` is always a multiple of the slot size relative to nothing in
/// particular; it is aligned to the slot stride at block acquisition so
/// every carved slot address is a multiple of the slot size.
struct BumpState {
    blocks: Vec<Block>,
    cursor: usize,
    limit: usize,
}

/// A memory pool for one fixed slot size.
///
/// Allocation prefers the lock-free free list and falls back to bump
/// carving under the mutex. Deallocation is always lock-free.
pub struct Pool {
    slot_size: usize,
    block_size: usize,
    free_list: FreeList,
    bump: Mutex<BumpState>,
}

// SAFETY: the free list is built on atomics and the bump state is behind a
// Mutex; raw pointers held in blocks are owned exclusively by the pool.
unsafe impl Send for Pool {}
unsafe impl Sync for Pool {}

impl Pool {
    /// Creates a pool with the default block size.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::InvalidConfig`] for slot sizes that cannot
    /// host the intrusive free-list link (zero, or smaller than a machine
    /// word).
    pub fn new(slot_size: usize) -> AllocResult<Self> {
        Self::with_block_size(slot_size, DEFAULT_BLOCK_SIZE)
    }

    /// Creates a pool carving `block_size`-byte blocks into `slot_size`
    /// slots.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::InvalidConfig`] when the slot size is zero or
    /// smaller than a machine word, or when the block is too small to yield
    /// at least one slot after worst-case stride padding.
    pub fn with_block_size(slot_size: usize, block_size: usize) -> AllocResult<Self> {
        if slot_size == 0 {
            return Err(AllocError::invalid_config("slot size must be non-zero"));
        }
        if slot_size < size_of::<*mut u8>() {
            return Err(AllocError::invalid_config(
                "slot size must hold a free-list link (one machine word)",
            ));
        }
        let min_block = slot_size
            .checked_mul(2)
            .ok_or(AllocError::invalid_config("slot size overflows block math"))?;
        if block_size < min_block {
            return Err(AllocError::invalid_config(
                "block size must cover at least one slot plus stride padding",
            ));
        }
        #[cfg(feature = "logging")]
        tracing::trace!(slot_size, block_size, "pool created");
        Ok(Self {
            slot_size,
            block_size,
            free_list: FreeList::new(),
            bump: Mutex::new(BumpState {
                blocks: Vec::new(),
                cursor: 0,
                limit: 0,
            }),
        })
    }

    /// Slot size served by this pool, in bytes.
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Block size requested from the global allocator, in bytes.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks currently owned by this pool.
    pub fn block_count(&self) -> usize {
        self.bump.lock().blocks.len()
    }

    /// Checks whether `ptr` falls inside memory owned by this pool.
    ///
    /// Diagnostic only: a `true` answer does not say whether the slot is
    /// currently allocated or free.
    pub fn owns(&self, ptr: NonNull<u8>) -> bool {
        let addr = ptr.as_ptr() as usize;
        self.bump.lock().blocks.iter().any(|b| b.contains(addr))
    }

    /// Hands out one slot.
    ///
    /// Tries the free list first; on miss, carves from the current block
    /// under the mutex, acquiring a fresh block when the block is exhausted.
    /// The returned memory is uninitialized (it may hold a stale free-list
    /// link) and its address is a multiple of the slot size.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::OutOfMemory`] when a new block is needed and
    /// the global allocator refuses it.
    pub fn allocate(&self) -> AllocResult<NonNull<u8>> {
        if let Some(slot) = self.free_list.pop() {
            return Ok(slot);
        }

        let mut bump = self.bump.lock();
        if bump.cursor + self.slot_size > bump.limit {
            self.grow(&mut bump)?;
        }
        let addr = bump.cursor;
        bump.cursor += self.slot_size;
        debug_assert!(addr % self.slot_size == 0);
        // SAFETY: `addr` points into a live block and is never zero.
        Ok(unsafe { NonNull::new_unchecked(addr as *mut u8) })
    }

    /// Returns a slot to this pool's free list.
    ///
    /// Lock-free; never blocks and never fails.
    ///
    /// # Safety
    ///
    /// `slot` must have been produced by [`allocate`](Self::allocate) on
    /// this same pool, must not be in use, and must not be released twice.
    pub unsafe fn deallocate(&self, slot: NonNull<u8>) {
        self.free_list.push(slot);
    }

    /// Acquires a fresh block and resets the carving window onto it.
    ///
    /// The remainder of the previous block, if any, is abandoned: at most
    /// one partial slot per block.
    fn grow(&self, bump: &mut BumpState) -> AllocResult<()> {
        let block = Block::alloc(self.block_size)?;
        let base = block.base();
        let start = base + pad_to_stride(base, self.slot_size);
        debug_assert!(start + self.slot_size <= base + block.len());
        bump.cursor = start;
        bump.limit = base + block.len();
        bump.blocks.push(block);
        #[cfg(feature = "logging")]
        tracing::debug!(
            slot_size = self.slot_size,
            block_size = self.block_size,
            blocks = bump.blocks.len(),
            "pool acquired a new block"
        );
        Ok(())
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("slot_size", &self.slot_size)
            .field("block_size", &self.block_size)
            .field("blocks", &self.block_count())
            .finish()
    }
}
