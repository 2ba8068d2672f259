use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use msgcache::{CacheConfig, MessageCache, PolicyKind};
use msglog::{Message, MessageLog};
use tempfile::TempDir;

fn message(id: u64) -> Message {
    Message::new(id, "Sender", "Receiver", "0123456789", false).unwrap()
}

fn bench_cached_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_lookup");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("lookup_hit", |b| {
        let dir = TempDir::new().unwrap();
        let log = MessageLog::open(dir.path()).unwrap();
        let mut cache = MessageCache::new(log, CacheConfig::new(128)).unwrap();

        // Pre-populate
        for id in 0..100 {
            cache.put(message(id)).unwrap();
        }

        let mut counter = 0u64;
        b.iter(|| {
            black_box(cache.lookup(counter % 100).unwrap());
            counter += 1;
        });
    });

    group.finish();
}

fn bench_policies_under_misses(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_with_fallback");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    for policy in [PolicyKind::Lru, PolicyKind::Random] {
        group.bench_function(format!("{}_100_keys_cap_16", policy), |b| {
            let dir = TempDir::new().unwrap();
            let log = MessageLog::open(dir.path()).unwrap();
            let config = CacheConfig::new(16).with_policy(policy).with_seed(1);
            let mut cache = MessageCache::new(log, config).unwrap();

            // Pre-populate with more than cache size
            for id in 0..100 {
                cache.put(message(id)).unwrap();
            }

            let mut counter = 0u64;
            b.iter(|| {
                // Stride through keys so most lookups miss
                black_box(cache.lookup((counter * 7) % 100).unwrap());
                counter += 1;
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cached_lookup, bench_policies_under_misses);
criterion_main!(benches);
