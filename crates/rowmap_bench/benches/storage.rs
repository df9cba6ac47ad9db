//! In-memory connection benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rowmap_bench::populated_items;
use rowmap_codec::Row;
use rowmap_storage::Connection;

/// Benchmark inserts into a growing table.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_insert");

    for existing in [0, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(existing), existing, |b, &existing| {
            let mut conn = populated_items(existing);
            let row = Row::new().with("label", "bench");
            b.iter(|| black_box(conn.insert("items", black_box(&row)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark key lookups.
fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_select");

    for rows in [100, 1000, 10_000].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(rows), rows, |b, &rows| {
            let conn = populated_items(rows);
            let predicate = Row::new().with("id", (rows / 2) as i64);
            b.iter(|| black_box(conn.select(&["label"], "items", &predicate).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark updates by key.
fn bench_update(c: &mut Criterion) {
    let mut conn = populated_items(1000);
    let predicate = Row::new().with("id", 500i64);
    let values = Row::new().with("label", "updated");

    c.bench_function("memory_update_by_key", |b| {
        b.iter(|| black_box(conn.update("items", &values, &predicate).unwrap()));
    });
}

criterion_group!(benches, bench_insert, bench_select, bench_update);

criterion_main!(benches);
