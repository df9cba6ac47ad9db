//! Entity manager flush benchmarks.

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use rowmap_core::EntityRef;
use rowmap_testkit::{scenarios, TestManager, User};

/// Benchmark persisting and flushing a batch of new users.
fn bench_insert_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_flush");

    for batch_size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                b.iter_batched(
                    || {
                        let users: Vec<_> = (0..batch_size)
                            .map(|i| EntityRef::new(User::new(format!("user{i}"), None)))
                            .collect();
                        (TestManager::new(), users)
                    },
                    |(mut test, users)| {
                        for user in &users {
                            test.persist(user).unwrap();
                        }
                        black_box(test.flush().unwrap());
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

/// Benchmark flushing tracked users that did not change.
fn bench_clean_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("clean_flush");

    for tracked in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*tracked as u64));
        group.bench_with_input(BenchmarkId::from_parameter(tracked), tracked, |b, &tracked| {
            let (mut test, _users) = scenarios::populated_users(tracked);
            b.iter(|| {
                let report = test.flush().unwrap();
                black_box(report.writes());
            });
        });
    }
    group.finish();
}

/// Benchmark flushing when a fraction of tracked users changed.
fn bench_dirty_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("dirty_flush");
    let tracked = 1000;

    for dirty_every in [1, 10, 100].iter() {
        group.throughput(Throughput::Elements(tracked as u64));
        group.bench_with_input(
            BenchmarkId::new("every", dirty_every),
            dirty_every,
            |b, &dirty_every| {
                let (mut test, users) = scenarios::populated_users(tracked);
                let mut round = 0u64;
                b.iter(|| {
                    round += 1;
                    for user in users.iter().step_by(dirty_every) {
                        user.write().name = format!("user-{round}");
                    }
                    black_box(test.flush().unwrap());
                });
            },
        );
    }
    group.finish();
}

/// Benchmark loading a single user by key.
fn bench_find(c: &mut Criterion) {
    let (mut test, _users) = scenarios::populated_users(1000);

    c.bench_function("find_by_key", |b| {
        let mut id = 0i64;
        b.iter(|| {
            id = id % 1000 + 1;
            let found = test.find::<User>(&[id.into()]).unwrap();
            black_box(found);
        });
    });
}

criterion_group!(
    benches,
    bench_insert_flush,
    bench_clean_flush,
    bench_dirty_flush,
    bench_find,
);

criterion_main!(benches);
