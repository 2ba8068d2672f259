use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use msglog::{Message, MessageLog};
use tempfile::TempDir;

fn message(id: u64) -> Message {
    Message::new(id, "Sender", "Receiver", "0123456789", false).unwrap()
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("append_new_key", |b| {
        let dir = TempDir::new().unwrap();
        let log = MessageLog::open(dir.path()).unwrap();
        let mut id = 0u64;

        b.iter(|| {
            black_box(log.append(&message(id)).unwrap());
            id += 1;
        });
    });
    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("scan_100_rows", |b| {
        let dir = TempDir::new().unwrap();
        let log = MessageLog::open(dir.path()).unwrap();

        // Pre-populate with 100 rows
        for id in 0..100 {
            log.append(&message(id)).unwrap();
        }

        let mut counter = 0u64;
        b.iter(|| {
            black_box(log.scan_for_key(counter % 100).unwrap());
            counter += 1;
        });
    });

    group.bench_function("exists_miss_100_rows", |b| {
        let dir = TempDir::new().unwrap();
        let log = MessageLog::open(dir.path()).unwrap();

        for id in 0..100 {
            log.append(&message(id)).unwrap();
        }

        b.iter(|| {
            black_box(log.exists_key(1_000).unwrap());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_append, bench_scan);
criterion_main!(benches);
