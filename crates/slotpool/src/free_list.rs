//! Lock-free free list of reclaimed slots.
//!
//! A Treiber stack whose nodes live inside the freed slots themselves: the
//! first machine word of a free slot stores the address of the next free
//! slot. Push and pop are compare-and-swap loops; neither ever blocks, and
//! a failed CAS is routine contention that is simply retried.
//!
//! All raw-pointer manipulation of the reuse path is confined to this
//! module; the rest of the crate deals in [`NonNull<u8>`] slots it treats
//! as opaque.
//!
//! # Memory ordering
//!
//! A push publishes the slot with a Release CAS on the head; a pop observes
//! the head with Acquire (both the initial load and the successful CAS), so
//! every write that happened before the push is visible to whichever thread
//! pops the slot. That is the entire contract: slots are reused as opaque
//! raw memory and fully re-initialized by the next allocation's caller.
//!
//! # ABA
//!
//! The stack works on bare addresses with no version tag. A pop that reads
//! head `A` and its link, then races with `A` being popped, reused and
//! pushed again, can install a stale link. Pools never return blocks to the
//! system before teardown, so an address can never migrate into a different
//! pool; the remaining intra-pool window under extreme interleavings is a
//! known limitation of this layout, accepted in exchange for the
//! single-word node with no versioning overhead.

use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicPtr, Ordering};

use crate::utils::{Backoff, is_aligned};

/// A free slot viewed as a list node.
///
/// Lives inside reclaimed slot memory; never allocated on its own. The
/// link is atomic so a pop racing a concurrent re-push of the same slot
/// reads a stale but well-defined value.
#[repr(transparent)]
struct Link {
    next: AtomicPtr<Link>,
}

/// Lock-free LIFO of freed slots.
pub(crate) struct FreeList {
    head: AtomicPtr<Link>,
}

impl FreeList {
    pub(crate) const fn new() -> Self {
        Self {
            head: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Pushes a freed slot onto the list.
    ///
    /// The slot must be at least one machine word long and word-aligned;
    /// its previous contents are overwritten by the link.
    pub(crate) fn push(&self, slot: NonNull<u8>) {
        debug_assert!(is_aligned(
            slot.as_ptr() as usize,
            core::mem::align_of::<Link>()
        ));
        let node = slot.as_ptr().cast::<Link>();
        let mut backoff = Backoff::new();
        let mut head = self.head.load(Ordering::Relaxed);
        loop {
            // SAFETY: until the CAS below succeeds the slot is owned by this
            // call; the word is writable, word-aligned memory inside a live
            // block, and it is only ever accessed atomically.
            unsafe { (*node).next.store(head, Ordering::Relaxed) };
            match self
                .head
                .compare_exchange_weak(head, node, Ordering::Release, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => {
                    head = actual;
                    backoff.spin();
                }
            }
        }
    }

    /// Pops the most recently freed slot.
    ///
    /// `None` means the list is empty; callers fall through to bump carving.
    /// This is a signal, not an error.
    pub(crate) fn pop(&self) -> Option<NonNull<u8>> {
        let mut backoff = Backoff::new();
        loop {
            let head = self.head.load(Ordering::Acquire);
            let node = NonNull::new(head)?;
            // SAFETY: `head` was published by a push whose Release CAS the
            // Acquire load above synchronized with, so the link word is
            // valid for atomic reads. The value is discarded if the CAS
            // below loses the race.
            let next = unsafe { node.as_ref().next.load(Ordering::Relaxed) };
            match self
                .head
                .compare_exchange_weak(head, next, Ordering::Acquire, Ordering::Relaxed)
            {
                Ok(_) => return Some(node.cast()),
                Err(_) => backoff.spin(),
            }
        }
    }

    /// Checks whether the list currently holds no slots.
    pub(crate) fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire).is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::alloc::{Layout, alloc, dealloc};
    use std::sync::Arc;
    use std::thread;

    /// Backing storage for test slots, carved at a fixed stride.
    struct Slab {
        base: *mut u8,
        layout: Layout,
    }

    impl Slab {
        fn new(slots: usize, stride: usize) -> Self {
            let layout = Layout::from_size_align(slots * stride, 8).unwrap();
            let base = unsafe { alloc(layout) };
            assert!(!base.is_null());
            Self { base, layout }
        }

        fn slot(&self, index: usize, stride: usize) -> NonNull<u8> {
            unsafe { NonNull::new_unchecked(self.base.add(index * stride)) }
        }
    }

    impl Drop for Slab {
        fn drop(&mut self) {
            unsafe { dealloc(self.base, self.layout) };
        }
    }

    #[test]
    fn pop_on_empty_list_is_none() {
        let list = FreeList::new();
        assert!(list.is_empty());
        assert!(list.pop().is_none());
    }

    #[test]
    fn push_pop_is_lifo() {
        let slab = Slab::new(3, 16);
        let (a, b, c) = (slab.slot(0, 16), slab.slot(1, 16), slab.slot(2, 16));

        let list = FreeList::new();
        list.push(a);
        list.push(b);
        list.push(c);

        assert_eq!(list.pop(), Some(c));
        assert_eq!(list.pop(), Some(b));
        assert_eq!(list.pop(), Some(a));
        assert!(list.pop().is_none());
    }

    #[test]
    fn concurrent_churn_loses_no_slots() {
        const SLOTS: usize = 64;
        const THREADS: usize = 8;
        const ROUNDS: usize = 1_000;

        let slab = Slab::new(SLOTS, 16);
        let list = Arc::new(FreeList::new());
        for i in 0..SLOTS {
            list.push(slab.slot(i, 16));
        }

        thread::scope(|scope| {
            for _ in 0..THREADS {
                let list = Arc::clone(&list);
                scope.spawn(move || {
                    for _ in 0..ROUNDS {
                        if let Some(slot) = list.pop() {
                            list.push(slot);
                        }
                    }
                });
            }
        });

        let mut drained = Vec::new();
        while let Some(slot) = list.pop() {
            drained.push(slot.as_ptr() as usize);
        }
        drained.sort_unstable();
        drained.dedup();
        assert_eq!(drained.len(), SLOTS);
    }
}
