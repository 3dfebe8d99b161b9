use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ttlcache::{Cache, CacheConfig};

fn populated(max_size: usize) -> Cache<u64, Vec<u8>> {
    let cache = Cache::with_config(CacheConfig::new(Duration::from_secs(3600)).max_size(max_size))
        .unwrap();
    for id in 0..100u64 {
        cache.add(id, vec![b'x'; 1024]).unwrap();
    }
    cache
}

fn bench_cached_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_get");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_1kb_hit", |b| {
        let cache = populated(1000);
        let mut counter = 0u64;
        b.iter(|| {
            black_box(cache.get(&(counter % 100)));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_mixed_50_50(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("50_read_50_write", |b| {
        let cache = populated(1000);
        let data = vec![b'x'; 1024];
        let mut counter = 0u64;
        b.iter(|| {
            if counter % 2 == 0 {
                black_box(cache.get(&(counter % 100)));
            } else {
                black_box(cache.add(100 + counter, data.clone()).ok());
            }
            counter += 1;
        });
    });

    group.finish();
}

fn bench_evicting_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("evicting_add");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("add_1kb_full", |b| {
        let cache = populated(10); // Every add evicts the tail
        let data = vec![b'x'; 1024];
        let mut counter = 1_000u64;
        b.iter(|| {
            black_box(cache.add(counter, data.clone()).ok());
            counter += 1;
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_cached_get,
    bench_mixed_50_50,
    bench_evicting_add
);
criterion_main!(benches);
