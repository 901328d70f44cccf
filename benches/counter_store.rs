//! Hot path benchmarks for the live counter store.
//!
//! Run with: `cargo bench --bench counter_store`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tally::model::{Catalog, TimeBucket};
use tally::service::counter_store::CounterStore;

fn bench_record_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_view");
    group.throughput(Throughput::Elements(1));

    let catalog = Catalog::default();
    let sports = catalog.get("sports").cloned().unwrap();
    let bucket = TimeBucket::from("01 Jan 24 00:00 +0000");

    group.bench_function("existing_key", |b| {
        let store = CounterStore::new();
        store.record_view(&sports, &bucket);
        b.iter(|| store.record_view(black_box(&sports), black_box(&bucket)))
    });

    group.bench_function("new_key_each_minute", |b| {
        let store = CounterStore::new();
        let buckets: Vec<TimeBucket> = (0..1_440)
            .map(|minute| format!("01 Jan 24 {:02}:{:02} +0000", minute / 60, minute % 60).into())
            .collect();
        let mut next = buckets.iter().cycle();
        b.iter(|| {
            if let Some(bucket) = next.next() {
                store.record_view(black_box(&sports), black_box(bucket))
            }
        })
    });

    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");
    group.throughput(Throughput::Elements(4 * 1_000));

    let catalog = Catalog::default();
    let bucket = TimeBucket::from("01 Jan 24 00:00 +0000");

    group.bench_function("four_threads_same_key", |b| {
        let sports = catalog.get("sports").cloned().unwrap();
        b.iter(|| {
            let store = Arc::new(CounterStore::new());
            std::thread::scope(|scope| {
                for _ in 0..4 {
                    let store = store.clone();
                    let sports = &sports;
                    let bucket = &bucket;
                    scope.spawn(move || {
                        for _ in 0..1_000 {
                            store.record_view(sports, bucket);
                        }
                    });
                }
            });
            black_box(store.len())
        })
    });

    group.bench_function("four_threads_distinct_keys", |b| {
        let contents: Vec<_> = catalog.iter().cloned().collect();
        b.iter(|| {
            let store = Arc::new(CounterStore::new());
            std::thread::scope(|scope| {
                for content in &contents {
                    let store = store.clone();
                    let bucket = &bucket;
                    scope.spawn(move || {
                        for _ in 0..1_000 {
                            store.record_view(content, bucket);
                        }
                    });
                }
            });
            black_box(store.len())
        })
    });

    group.finish();
}

fn bench_drain(c: &mut Criterion) {
    let catalog = Catalog::default();

    c.bench_function("drain_1000_entries", |b| {
        let store = CounterStore::new();
        b.iter(|| {
            for minute in 0..250 {
                let bucket = TimeBucket::from(format!("01 Jan 24 00:{minute:03} +0000"));
                for content in catalog.iter() {
                    store.record_view(content, &bucket);
                }
            }
            black_box(store.drain())
        })
    });
}

criterion_group!(benches, bench_record_view, bench_contended, bench_drain);
criterion_main!(benches);
