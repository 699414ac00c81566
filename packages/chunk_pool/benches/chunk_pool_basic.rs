//! Basic benchmarks for the `chunk_pool` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::iter;
use std::time::Instant;

use alloc_tracker::Allocator;
use chunk_pool::PoolAllocator;
use criterion::{Criterion, criterion_group, criterion_main};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

type TestItem = usize;

const CHUNK_ELEMS: usize = 128;

fn new_allocator(per_element_free: bool) -> PoolAllocator<TestItem> {
    PoolAllocator::builder()
        .chunk_elems(CHUNK_ELEMS)
        .per_element_free(per_element_free)
        .build()
        .unwrap()
}

fn entrypoint(c: &mut Criterion) {
    let allocs = alloc_tracker::Session::new();

    let mut group = c.benchmark_group("chunk_pool_basic");

    let allocs_op = allocs.operation("build_empty");
    group.bench_function("build_empty", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(new_allocator(false)));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("allocate_one");
    group.bench_function("allocate_one", |b| {
        b.iter_custom(|iters| {
            let allocators = iter::repeat_with(|| new_allocator(false))
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for allocator in &allocators {
                _ = black_box(allocator.allocate(black_box(1)).unwrap());
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("recycle_one");
    group.bench_function("recycle_one", |b| {
        b.iter_custom(|iters| {
            let allocator = new_allocator(true);
            let slot = allocator.allocate(1).unwrap();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                // SAFETY: The slot came from this allocator and is only ever reallocated below.
                unsafe { allocator.deallocate(black_box(slot), 1) };
                _ = black_box(allocator.allocate(1).unwrap());
            }

            start.elapsed()
        });
    });

    group.finish();

    let mut group = c.benchmark_group("chunk_pool_slow");

    let allocs_op = allocs.operation("allocate_10k");
    group.bench_function("allocate_10k", |b| {
        b.iter_custom(|iters| {
            let allocators = iter::repeat_with(|| new_allocator(false))
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for allocator in &allocators {
                for _ in 0..10_000 {
                    _ = black_box(allocator.allocate(black_box(1)).unwrap());
                }
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("reserved_10k");
    group.bench_function("reserved_10k", |b| {
        b.iter_custom(|iters| {
            let allocators = iter::repeat_with(|| {
                let allocator = new_allocator(false);
                allocator.reserve(10_000).unwrap();
                allocator
            })
            .take(usize::try_from(iters).unwrap())
            .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for allocator in &allocators {
                for _ in 0..10_000 {
                    _ = black_box(allocator.allocate(black_box(1)).unwrap());
                }
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("forward_10_back_5_times_1000");
    group.bench_function("forward_10_back_5_times_1000", |b| {
        // We allocate 10 slots, release the first 5 and repeat this 1000 times.
        // This stresses the interplay between the free list and bump allocation.
        b.iter_custom(|iters| {
            let allocators = iter::repeat_with(|| new_allocator(true))
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let mut to_release = Vec::with_capacity(5);

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for allocator in &allocators {
                for _ in 0..1000 {
                    to_release.clear();

                    for _ in 0..5 {
                        to_release.push(allocator.allocate(1).unwrap());
                    }

                    for _ in 0..5 {
                        _ = black_box(allocator.allocate(1).unwrap());
                    }

                    #[expect(clippy::iter_with_drain, reason = "to reuse the buffer")]
                    for slot in to_release.drain(..) {
                        // SAFETY: Each slot came from this allocator and is released once.
                        unsafe { allocator.deallocate(slot, 1) };
                    }
                }
            }

            start.elapsed()
        });
    });

    group.finish();

    allocs.print_to_stdout();
}
