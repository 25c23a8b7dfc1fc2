//! Performance benchmarks for ChatRelay

use chatrelay::server::dispatcher;
use chatrelay::server::{ClientHandle, LogStore};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;
use tempfile::tempdir;
use tokio::runtime::Runtime;

/// Benchmark one append against logs of growing size.
///
/// Every append reads, sorts and rewrites the whole file, so cost grows
/// with the number of stored lines.
fn bench_append_vs_log_size(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("append_vs_log_size");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for existing in [100usize, 1000, 5000].iter() {
        let temp_dir = tempdir().unwrap();
        let store = LogStore::new(temp_dir.path().join("bench.log"));

        rt.block_on(async {
            store.reset().await.unwrap();
            for i in 0..*existing {
                store.append(&format!("seed message {:06}", i)).await.unwrap();
            }
        });

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(existing),
            existing,
            |b, _| {
                let mut counter = 0u64;
                b.to_async(&rt).iter(|| {
                    counter += 1;
                    let message = format!("bench message {}", counter);
                    let store = &store;
                    async move {
                        store.append(&message).await.unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark fan-out to in-memory peers
fn bench_broadcast_fanout(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("broadcast_fanout");
    group.measurement_time(Duration::from_secs(5));
    group.sample_size(20);

    for client_count in [5usize, 50, 500].iter() {
        group.throughput(Throughput::Elements(*client_count as u64));
        group.bench_with_input(
            BenchmarkId::new("clients", client_count),
            client_count,
            |b, &num_clients| {
                let targets: Vec<ClientHandle> = (0..num_clients)
                    .map(|_| ClientHandle::new("127.0.0.1:9".parse().unwrap(), tokio::io::sink()))
                    .collect();

                b.to_async(&rt).iter(|| {
                    let targets = &targets;
                    async move {
                        dispatcher::broadcast("benchmark payload", targets).await;
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_append_vs_log_size, bench_broadcast_fanout);
criterion_main!(benches);
