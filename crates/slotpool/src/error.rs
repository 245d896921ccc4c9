//! Error types for pool allocation operations.
//!
//! Only genuine failures surface here. A zero-size request and the release
//! of an absent address are silently absorbed by the registry, and a failed
//! compare-and-swap on a free list is routine contention, retried without
//! ever reaching the caller.

use thiserror::Error;

/// Result type for allocation operations.
pub type AllocResult<T> = Result<T, AllocError>;

/// Errors produced by pools, the size-class registry and the typed layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    /// A pool was constructed with parameters it cannot operate with.
    #[error("invalid pool configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: &'static str,
    },

    /// The global allocator could not provide the requested memory.
    ///
    /// Raised when a pool cannot obtain a new block or an oversize request
    /// cannot be satisfied. Never retried internally and never swallowed.
    #[error("out of memory: failed to obtain {requested} bytes from the global allocator")]
    OutOfMemory {
        /// Number of bytes requested from the global allocator.
        requested: usize,
    },

    /// A typed request needs stricter alignment than its size class provides.
    #[error("alignment {required} exceeds the {guaranteed}-byte guarantee of the routed size class")]
    InvalidAlignment {
        /// Alignment the type requires.
        required: usize,
        /// Alignment the routed size class can guarantee.
        guaranteed: usize,
    },
}

impl AllocError {
    /// Creates an invalid-configuration error.
    pub fn invalid_config(reason: &'static str) -> Self {
        Self::InvalidConfig { reason }
    }

    /// Creates an out-of-memory error for a bulk request of `requested` bytes.
    pub fn out_of_memory(requested: usize) -> Self {
        Self::OutOfMemory { requested }
    }

    /// Creates an invalid-alignment error.
    pub fn invalid_alignment(required: usize, guaranteed: usize) -> Self {
        Self::InvalidAlignment {
            required,
            guaranteed,
        }
    }

    /// Checks if this is an out-of-memory error.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = AllocError::out_of_memory(4096);
        assert!(err.to_string().contains("4096"));
        assert!(err.is_out_of_memory());

        let err = AllocError::invalid_config("slot size must be non-zero");
        assert!(err.to_string().contains("slot size"));

        let err = AllocError::invalid_alignment(64, 8);
        assert!(err.to_string().contains("64"));
        assert!(err.to_string().contains("8-byte"));
    }
}
