//! Allocation throughput: size-class pools against the global allocator.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use slotpool::{PoolBox, SizeClassRegistry};

fn bench_request_release(c: &mut Criterion) {
    let registry = SizeClassRegistry::new();
    let mut group = c.benchmark_group("request_release");

    for size in [8usize, 64, 256, 512] {
        group.bench_with_input(BenchmarkId::new("pooled", size), &size, |b, &size| {
            b.iter(|| {
                let ptr = registry.request(black_box(size)).unwrap();
                unsafe { registry.release(ptr, size) };
            });
        });
        group.bench_with_input(BenchmarkId::new("global", size), &size, |b, &size| {
            b.iter(|| {
                let layout = std::alloc::Layout::from_size_align(size, 8).unwrap();
                unsafe {
                    let ptr = std::alloc::alloc(layout);
                    std::alloc::dealloc(black_box(ptr), layout);
                }
            });
        });
    }
    group.finish();
}

fn bench_typed_round_trip(c: &mut Criterion) {
    let registry = SizeClassRegistry::new();
    let mut group = c.benchmark_group("typed_round_trip");

    group.bench_function("pool_box_u64x8", |b| {
        b.iter(|| {
            let boxed = PoolBox::new_in(black_box([7u64; 8]), &registry).unwrap();
            black_box(&*boxed);
        });
    });
    group.bench_function("heap_box_u64x8", |b| {
        b.iter(|| {
            let boxed = Box::new(black_box([7u64; 8]));
            black_box(&*boxed);
        });
    });
    group.finish();
}

fn bench_warm_reuse(c: &mut Criterion) {
    let registry = SizeClassRegistry::new();
    // Prime the 64-byte class so reuse never carves.
    let warm = registry.request(64).unwrap();
    unsafe { registry.release(warm, 64) };

    c.bench_function("warm_reuse_64", |b| {
        b.iter(|| {
            let ptr = registry.request(64).unwrap();
            unsafe { registry.release(ptr, 64) };
        });
    });
}

criterion_group!(
    benches,
    bench_request_release,
    bench_typed_round_trip,
    bench_warm_reuse
);
criterion_main!(benches);
