//! Seed and read/write workload benchmarks against `MemoryStore`.
//!
//! Run: `cargo bench --bench workload`

use std::sync::atomic::{AtomicU64, Ordering};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use financier_bench::generator::{Distribution, TaskSpec};
use financier_bench::{MemoryStore, NoopObserver, Seeder, WorkloadRunner};

const RECORDS: u64 = 10_000;
const RECORD_SIZE: usize = 1000;

fn seed(c: &mut Criterion) {
    let mut group = c.benchmark_group("financier/seed");

    for records in [1_000u64, 10_000] {
        group.throughput(Throughput::Elements(records));
        group.bench_with_input(BenchmarkId::new("records", records), &records, |b, &n| {
            b.iter(|| {
                let store = MemoryStore::new();
                Seeder::new(&store, NoopObserver).seed(n, RECORD_SIZE).unwrap()
            });
        });
    }
    group.finish();
}

fn read_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("financier/read_write");
    group.throughput(Throughput::Elements(1));

    let store = MemoryStore::new();
    Seeder::new(&store, NoopObserver)
        .seed(RECORDS, RECORD_SIZE)
        .unwrap();
    let runner = WorkloadRunner::new(&store, NoopObserver);

    let mixes = [(8usize, 0usize), (4, 4), (1, 1), (0, 8)];
    let dists = [
        ("uniform", Distribution::Uniform),
        ("zipf", Distribution::Zipf { s: 1.1 }),
    ];

    for (reads, writes) in mixes {
        for (dist_label, distribution) in dists {
            let tasks = TaskSpec {
                n_txn: 1024,
                n_accounts: RECORDS as usize,
                delay_millis: 0,
                n_reads: reads,
                n_writes: writes,
                update_size: RECORD_SIZE,
                distribution,
                seed: 0xBEEF,
            }
            .generate()
            .unwrap();

            let counter = AtomicU64::new(0);
            let id = BenchmarkId::new(format!("r{}w{}", reads, writes), dist_label);
            group.bench_function(id, |b| {
                b.iter(|| {
                    let i = counter.fetch_add(1, Ordering::Relaxed) as usize % tasks.len();
                    runner.run(&tasks[i]).unwrap()
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, seed, read_write);
criterion_main!(benches);
