//! Walks through the three ways to allocate: typed handles, raw byte
//! requests, and the process-wide registry.
//!
//! Run with `cargo run --example basic_usage`.

use slotpool::{AllocError, PoolBox, SizeClassRegistry};

fn main() -> Result<(), AllocError> {
    let registry = SizeClassRegistry::new();

    // Typed allocation: constructed in place, destroyed and recycled on
    // drop.
    let message = PoolBox::new_in(String::from("pooled"), &registry)?;
    println!("typed value: {message}");
    let recovered = message.into_inner();
    println!("moved back out: {recovered}");

    // Raw bytes: the request rounds up to the owning size class.
    let ptr = registry.request(100)?;
    if let Some(ptr) = ptr {
        println!("100-byte request served at {:p}", ptr.as_ptr());
    }
    // SAFETY: released once, with the size used at allocation time.
    unsafe { registry.release(ptr, 100) };

    // Requests past the largest class go straight to the global allocator.
    let big = registry.request(4096)?;
    unsafe { registry.release(big, 4096) };

    // The shared registry needs no setup call.
    let counter = PoolBox::new(0u64)?;
    println!("global registry value: {}", *counter);

    Ok(())
}
