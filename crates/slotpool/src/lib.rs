//! Fixed-size-class memory pools with lock-free slot reuse.
//!
//! This crate serves many small, short-lived allocations of bounded size
//! from a set of independent pools, one per rounded slot size. Each pool
//! carves slots out of large blocks obtained from the global allocator
//! (bump allocation) and recycles released slots through a lock-free free
//! list, avoiding per-allocation heap traffic and fragmentation.
//!
//! The building blocks, bottom up:
//!
//! - [`Pool`]: one arena for a single slot size; lock-free reuse fast path,
//!   short mutex-guarded slow path for carving and block acquisition.
//! - [`SizeClassRegistry`]: a fixed directory of 64 pools covering sizes
//!   8 to 512 bytes in 8-byte steps; larger requests bypass the pools and
//!   go straight to the global allocator.
//! - [`PoolBox`]: an owned, typed handle that couples in-place construction
//!   with guaranteed destroy-then-release on drop.
//!
//! # Example
//!
//! ```
//! use slotpool::{PoolBox, SizeClassRegistry};
//!
//! let registry = SizeClassRegistry::new();
//!
//! // Typed allocation through the registry.
//! let boxed = PoolBox::new_in([0u8; 48], &registry)?;
//! assert_eq!(boxed.len(), 48);
//! drop(boxed); // destructor runs, slot returns to the 48-byte pool
//!
//! // Raw byte requests round up to the owning size class.
//! let ptr = registry.request(40)?;
//! // SAFETY: released with the size used at allocation time.
//! unsafe { registry.release(ptr, 40) };
//! # Ok::<(), slotpool::AllocError>(())
//! ```
//!
//! # Concurrency
//!
//! Pools are safe to share across threads. Releasing and reusing slots is
//! entirely lock-free; only block acquisition and the bump cursor take a
//! short per-pool mutex. See [`pool`] for the exact discipline and the
//! documented ABA limitation of the free list.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod boxed;
pub mod error;
pub mod pool;
pub mod registry;
pub mod utils;

mod free_list;

pub use boxed::PoolBox;
pub use error::{AllocError, AllocResult};
pub use pool::{DEFAULT_BLOCK_SIZE, Pool};
pub use registry::{MAX_POOLED_SIZE, SIZE_CLASS_COUNT, SLOT_GRANULARITY, SizeClassRegistry};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
