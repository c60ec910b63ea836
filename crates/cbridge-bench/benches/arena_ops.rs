//! Criterion micro-benchmarks for boxed cell allocation.

use std::hint::black_box;

use cbridge_arena::CellArena;
use cbridge_core::ArenaConfig;
use criterion::{criterion_group, criterion_main, Criterion};

/// Benchmark: box 10K longs into a warm arena, then reset.
fn bench_box_10k(c: &mut Criterion) {
    let mut arena = CellArena::default();
    c.bench_function("box_long_10k", |b| {
        b.iter(|| {
            for i in 0..10_000i64 {
                black_box(arena.boxed_address(i));
            }
            arena.reset();
        });
    });
}

/// Benchmark: first run on a cold arena with small chunks (growth path).
fn bench_box_cold_small_chunks(c: &mut Criterion) {
    c.bench_function("box_int_10k_cold_1k_chunks", |b| {
        b.iter(|| {
            let mut arena = CellArena::new(ArenaConfig::with_chunk_bytes(1024)).unwrap();
            for i in 0..10_000i32 {
                black_box(arena.boxed_address(i));
            }
            black_box(arena.chunk_count());
        });
    });
}

/// Benchmark: the process-wide run arena used by the C ABI.
fn bench_run_arena(c: &mut Criterion) {
    c.bench_function("cb_addr_double_1k", |b| {
        b.iter(|| {
            for i in 0..1_000 {
                black_box(cbridge_ffi::run::cb_addr_double(i as f64));
            }
            cbridge_ffi::run::cb_run_reset();
        });
    });
}

criterion_group!(
    benches,
    bench_box_10k,
    bench_box_cold_small_chunks,
    bench_run_arena
);
criterion_main!(benches);
