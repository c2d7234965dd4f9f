use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use workpile::PoolBuilder;

fn bench_submit_wait(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_wait");
    for batch in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(batch));
        group.bench_with_input(BenchmarkId::new("unbounded", batch), &batch, |b, &batch| {
            let sum = Arc::new(AtomicU64::new(0));
            let s = sum.clone();
            let pool = PoolBuilder::new()
                .unbounded()
                .worker_fn(move |i: u64| {
                    s.fetch_add(black_box(i), Ordering::Relaxed);
                })
                .build()
                .unwrap();

            b.iter(|| {
                for i in 0..batch {
                    pool.submit(i).unwrap();
                }
                pool.wait();
            });

            pool.shutdown();
        });
    }
    group.finish();
}

criterion_group!(benches, bench_submit_wait);
criterion_main!(benches);
