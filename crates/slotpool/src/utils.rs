//! Alignment math and spin-loop helpers shared across the crate.

/// Checks if a value is aligned to the given power-of-two alignment.
///
/// # Examples
/// ```
/// use slotpool::utils::is_aligned;
///
/// assert!(is_aligned(16, 8));
/// assert!(is_aligned(32, 16));
/// assert!(!is_aligned(17, 8));
/// ```
#[inline(always)]
pub const fn is_aligned(value: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    value & (alignment - 1) == 0
}

/// Calculates padding needed to advance `addr` to the next multiple of
/// `stride`.
///
/// Unlike power-of-two alignment math, `stride` may be any non-zero value;
/// slot sizes such as 24 or 40 bytes are not powers of two.
///
/// # Examples
/// ```
/// use slotpool::utils::pad_to_stride;
///
/// assert_eq!(pad_to_stride(24, 24), 0);
/// assert_eq!(pad_to_stride(25, 24), 23);
/// assert_eq!(pad_to_stride(8, 24), 16);
/// ```
#[inline(always)]
pub const fn pad_to_stride(addr: usize, stride: usize) -> usize {
    let rem = addr % stride;
    if rem == 0 { 0 } else { stride - rem }
}

/// Bounded exponential backoff for spin loops.
///
/// Used in compare-and-swap retry loops to reduce cache-line contention.
/// Backoff is a latency optimization only: retries stay unbounded and are
/// never surfaced to callers.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: u32,
    max: u32,
}

impl Backoff {
    /// Create new backoff with default parameters.
    #[inline]
    pub fn new() -> Self {
        Self { current: 1, max: 64 }
    }

    /// Perform backoff.
    #[inline]
    pub fn spin(&mut self) {
        for _ in 0..self.current {
            core::hint::spin_loop();
        }
        if self.current < self.max {
            self.current *= 2;
        }
    }

    /// Reset backoff.
    #[inline]
    pub fn reset(&mut self) {
        self.current = 1;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
