//! Engine read/write path benchmarks
//!
//! Run with: cargo bench --package skiplite

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use skiplite::{Engine, EngineConfig, NodeStorage, ParkMiller};

const KEYS: u32 = 10_000;

fn filled(config: EngineConfig) -> Engine<u32, String> {
    let engine = Engine::with_config(config).expect("engine");
    for key in 0..KEYS {
        engine.insert(key, key.to_string()).expect("insert");
    }
    engine
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    group.throughput(Throughput::Elements(KEYS as u64));

    for storage in [NodeStorage::Heap, NodeStorage::Arena] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", storage)),
            &storage,
            |b, &storage| {
                b.iter(|| {
                    let config = EngineConfig::default().with_node_storage(storage);
                    black_box(filled(config))
                })
            },
        );
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.throughput(Throughput::Elements(1));

    let engine = filled(EngineConfig::default());
    let mut rng = ParkMiller::new(301);
    group.bench_function("list_hit", |b| {
        b.iter(|| black_box(engine.search(&rng.uniform(KEYS)).expect("search")))
    });

    group.bench_function("cache_hit", |b| {
        b.iter(|| black_box(engine.search(black_box(&7)).expect("search")))
    });

    // Keys above the filled range: mostly rejected by the Bloom filter
    group.bench_function("filter_miss", |b| {
        b.iter(|| black_box(engine.search(&(KEYS + rng.uniform(KEYS))).expect("search")))
    });

    let unfiltered = filled(EngineConfig::default().with_bloom_bits(None));
    group.bench_function("unfiltered_miss", |b| {
        b.iter(|| black_box(unfiltered.search(&(KEYS + rng.uniform(KEYS))).expect("search")))
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_search);
criterion_main!(benches);
