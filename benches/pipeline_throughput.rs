//! Benchmarks for pipeline throughput
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use modupipe::pipeline::prelude::*;
use modupipe::pipeline::{
    loader, mapper,
    sink::{NullSink, QueueSink},
    source::{Items, QueueSource, Random},
};

fn bench_mapper_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("mapper_chain");

    for size in [1_000usize, 10_000, 100_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("map_filter_buffer", size), size, |b, &size| {
            let items: Vec<u64> = (0..size as u64).collect();
            b.iter(|| {
                let source = Items::new(items.clone())
                    .mapped_with(mapper::Map::new(|x: u64| x.wrapping_mul(3)))
                    .mapped_with(mapper::Filter::new(|x: &u64| x % 2 == 0))
                    .mapped_with(mapper::Buffer::new(16));
                Pipeline::new(source, NullSink).run().unwrap();
            });
        });
    }

    group.finish();
}

fn bench_loader_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("loader_chain");
    group.throughput(Throughput::Elements(1));

    group.bench_function("buffer_then_sum", |b| {
        let mut chain = loader::Buffer::new(8).then(loader::IfPresent::new(loader::Map::new(
            |batch: Vec<f64>| batch.iter().sum::<f64>(),
        )));
        let mut i = 0u64;
        b.iter(|| {
            let out = chain.load(black_box(i as f64)).unwrap();
            i = i.wrapping_add(1);
            out
        });
    });

    group.finish();
}

fn bench_random_source(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_source");

    for limit in [1_000usize, 10_000].iter() {
        group.throughput(Throughput::Elements(*limit as u64));
        group.bench_with_input(BenchmarkId::new("max_iterations", limit), limit, |b, &limit| {
            let mut source = Random::seeded(7).max_iterations(limit);
            b.iter(|| {
                let pulled = source.fetch().take(limit).filter(|item| item.is_ok()).count();
                black_box(pulled)
            });
        });
    }

    group.finish();
}

fn bench_queue_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_handoff");

    for capacity in [1usize, 64, 1024].iter() {
        let items = 10_000usize;
        group.throughput(Throughput::Elements(items as u64));
        group.bench_with_input(
            BenchmarkId::new("two_threads", capacity),
            capacity,
            |b, &capacity| {
                b.iter(|| {
                    let queue = Queue::bounded(capacity);
                    let producer = Pipeline::new(
                        Items::new(0..items as u64),
                        QueueSink::new(queue.clone(), PutBlocking::new()),
                    );
                    let mut consumer_source = QueueSource::new(queue, GetBlocking::new());
                    let consumer =
                        Repeat::new(StepPipeline::new(&mut consumer_source, NullSink), items);
                    MultiThread::new(vec![Box::new(producer), Box::new(consumer)])
                        .run()
                        .unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_mapper_chain,
    bench_loader_chain,
    bench_random_source,
    bench_queue_handoff,
);

criterion_main!(benches);
