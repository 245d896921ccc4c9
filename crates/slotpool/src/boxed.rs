//! Owned, typed handles over registry slots.
//!
//! [`PoolBox`] couples in-place construction with guaranteed
//! destroy-then-release: the value is written directly into its slot, and
//! dropping the handle runs the value's destructor before the slot returns
//! to its pool. The raw request and release paths never run separately for
//! a value managed this way.

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use crate::error::{AllocError, AllocResult};
use crate::registry::{MAX_POOLED_SIZE, SLOT_GRANULARITY, SizeClassRegistry};

/// An owned value stored in a size-class slot.
///
/// Behaves like a `Box` whose backing memory comes from a
/// [`SizeClassRegistry`] instead of the global allocator. Zero-sized types
/// occupy no slot at all.
pub struct PoolBox<'r, T> {
    ptr: NonNull<T>,
    registry: &'r SizeClassRegistry,
}

// SAFETY: PoolBox owns its value exclusively, like Box; the registry
// reference is Sync. Thread-safety of the value carries over unchanged.
unsafe impl<T: Send> Send for PoolBox<'_, T> {}
unsafe impl<T: Sync> Sync for PoolBox<'_, T> {}

/// Largest alignment a slot of `size` bytes can promise.
///
/// Slot addresses are multiples of the slot size, so the guarantee is the
/// largest power of two dividing the rounded slot size. Oversize values go
/// through the global-allocator fallback at a fixed 16-byte alignment.
fn guaranteed_align(size: usize) -> usize {
    if size > MAX_POOLED_SIZE {
        return 16;
    }
    let slot = size.div_ceil(SLOT_GRANULARITY) * SLOT_GRANULARITY;
    1 << slot.trailing_zeros()
}

impl<'r, T> PoolBox<'r, T> {
    /// Constructs `value` in place inside a slot of `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::InvalidAlignment`] when `T` requires stricter
    /// alignment than its size class guarantees, and
    /// [`AllocError::OutOfMemory`] when the backing allocation fails.
    pub fn new_in(value: T, registry: &'r SizeClassRegistry) -> AllocResult<Self> {
        let size = size_of::<T>();
        if size == 0 {
            // No storage needed; the handle still runs T's destructor.
            let ptr = NonNull::<T>::dangling();
            // SAFETY: writing a ZST to a dangling, well-aligned pointer is
            // a no-op that takes ownership of `value`.
            unsafe { ptr::write(ptr.as_ptr(), value) };
            return Ok(Self { ptr, registry });
        }

        let required = align_of::<T>();
        let guaranteed = guaranteed_align(size);
        if required > guaranteed {
            return Err(AllocError::invalid_alignment(required, guaranteed));
        }

        let raw = match registry.request(size)? {
            Some(raw) => raw,
            // request only yields None for size zero, handled above.
            None => unreachable!("non-zero request returned no pointer"),
        };
        let ptr = raw.cast::<T>();
        // SAFETY: the slot holds at least `size` bytes and the alignment
        // check above ensures `ptr` is suitably aligned for T.
        unsafe { ptr::write(ptr.as_ptr(), value) };
        Ok(Self { ptr, registry })
    }

    /// Constructs `value` in a slot of the process-wide registry.
    ///
    /// # Errors
    ///
    /// Same as [`new_in`](Self::new_in).
    pub fn new(value: T) -> AllocResult<PoolBox<'static, T>> {
        PoolBox::new_in(value, SizeClassRegistry::global())
    }

    /// Moves the value out, returning its slot without running the
    /// destructor.
    pub fn into_inner(self) -> T {
        let this = ManuallyDrop::new(self);
        // SAFETY: `ptr` holds a valid T and the ManuallyDrop wrapper
        // prevents Drop from reading it again.
        let value = unsafe { ptr::read(this.ptr.as_ptr()) };
        if size_of::<T>() != 0 {
            // SAFETY: the slot came from this registry with this size and
            // the value has been moved out.
            unsafe { this.registry.release(Some(this.ptr.cast()), size_of::<T>()) };
        }
        value
    }
}

impl<T> Deref for PoolBox<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: `ptr` is valid and exclusively owned for the handle's
        // lifetime.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> DerefMut for PoolBox<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as above, with &mut self guaranteeing uniqueness.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Drop for PoolBox<'_, T> {
    fn drop(&mut self) {
        // SAFETY: the value is live until this point; destroy first, then
        // return the slot so it is never reachable while still holding a
        // live value.
        unsafe {
            ptr::drop_in_place(self.ptr.as_ptr());
            if size_of::<T>() != 0 {
                self.registry.release(Some(self.ptr.cast()), size_of::<T>());
            }
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for PoolBox<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        (**self).fmt(f)
    }
}

impl<T: std::fmt::Display> std::fmt::Display for PoolBox<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        (**self).fmt(f)
    }
}
