//! Criterion benchmarks for every multiplication strategy.
//!
//! Pool strategies are measured at several worker counts; the sequential
//! baselines run without a pool.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use matmul_pool::{Strategy, WorkerPool, create_seeded, multiply};

const SIZES: [usize; 2] = [128, 256];
const WORKER_COUNTS: [usize; 3] = [3, 4, 10];

fn bench_without_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("without_pool");
    group.sample_size(20);

    for size in SIZES {
        let a = create_seeded(size, 1).unwrap();
        let b = create_seeded(size, 2).unwrap();

        for strategy in [Strategy::Sequential, Strategy::SequentialTransposed] {
            group.bench_with_input(BenchmarkId::new(strategy.name(), size), &size, |bench, _| {
                bench.iter(|| black_box(multiply(&a, &b, strategy, None).unwrap()))
            });
        }
    }

    group.finish();
}

fn bench_with_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("with_pool");
    group.sample_size(20);

    for workers in WORKER_COUNTS {
        let pool = WorkerPool::new(workers).unwrap();

        for size in SIZES {
            let a = create_seeded(size, 1).unwrap();
            let b = create_seeded(size, 2).unwrap();

            for strategy in Strategy::CONCURRENT {
                let id = format!("{}/{}t", strategy.name(), workers);
                group.bench_with_input(BenchmarkId::new(id, size), &size, |bench, _| {
                    bench.iter(|| black_box(pool.multiply(&a, &b, strategy).unwrap()))
                });
            }
        }

        pool.shutdown();
    }

    group.finish();
}

criterion_group!(benches, bench_without_pool, bench_with_pool);
criterion_main!(benches);
