//! Buffer pool benchmarks.
//!
//! Measures buffer pool performance for:
//! - Page pin/unpin (cache hits)
//! - Sequential vs. random access
//! - Page write throughput
//! - Eviction under pressure
//! - Cache hit rate under a bounded working set

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;
use tupledb::{BufferPool, DiskManager, Fifo, PageId, PAGE_SIZE};

fn open_pool(capacity: usize) -> (BufferPool, TempDir) {
    let temp_dir = TempDir::new().expect("create temp dir");
    let db_path = temp_dir.path().join("bench.tbl");
    let disk_manager = DiskManager::create(&db_path).expect("create disk manager");
    let pool = BufferPool::new(capacity, Box::new(Fifo::new()), disk_manager).expect("create pool");
    (pool, temp_dir)
}

/// Pins and unpins a run of pages once, seeding them into the file.
fn seed_pages(pool: &mut BufferPool, count: i32) -> Vec<PageId> {
    let mut page_ids = Vec::new();
    for raw in 1..=count {
        let page_id = PageId::new(raw);
        let handle = pool.pin(page_id).expect("pin page");
        pool.frame_data_mut(handle)[0] = 0x42;
        pool.mark_dirty(page_id);
        pool.unpin(page_id);
        page_ids.push(page_id);
    }
    page_ids
}

fn bench_sequential_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_pool_sequential");

    let (mut pool, _temp) = open_pool(256);
    let page_ids = seed_pages(&mut pool, 100);

    group.throughput(Throughput::Elements(100));
    group.bench_function("100_pages_sequential", |b| {
        b.iter(|| {
            for &page_id in &page_ids {
                let handle = pool.pin(page_id).expect("pin page");
                black_box(pool.frame_data(handle)[0]);
                pool.unpin(page_id);
            }
        });
    });

    group.finish();
}

fn bench_random_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_pool_random");

    let (mut pool, _temp) = open_pool(128);
    let page_ids = seed_pages(&mut pool, 100);

    let mut access_pattern = Vec::new();
    let mut seed: u32 = 12345;
    for _ in 0..1000 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
        access_pattern.push(page_ids[(seed as usize) % page_ids.len()]);
    }

    group.throughput(Throughput::Elements(1000));
    group.bench_function("1000_random_accesses", |b| {
        b.iter(|| {
            for &page_id in &access_pattern {
                let handle = pool.pin(page_id).expect("pin page");
                black_box(pool.frame_data(handle)[0]);
                pool.unpin(page_id);
            }
        });
    });

    group.finish();
}

fn bench_page_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_pool_write");

    let (mut pool, _temp) = open_pool(256);
    let page_ids = seed_pages(&mut pool, 50);

    group.throughput(Throughput::Bytes(PAGE_SIZE as u64 * 50));
    group.bench_function("50_pages_write", |b| {
        b.iter(|| {
            for &page_id in &page_ids {
                let handle = pool.pin(page_id).expect("pin page");
                for byte in pool.frame_data_mut(handle).iter_mut() {
                    *byte = 0x42;
                }
                pool.mark_dirty(page_id);
                pool.unpin(page_id);
            }
        });
    });

    group.finish();
}

fn bench_eviction_pressure(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_pool_eviction");

    let pool_size = 32;
    let access_pages = 100;

    let (mut pool, _temp) = open_pool(pool_size);
    let page_ids = seed_pages(&mut pool, access_pages);

    group.throughput(Throughput::Elements(access_pages as u64));
    group.bench_function("eviction_heavy", |b| {
        b.iter(|| {
            for &page_id in &page_ids {
                let handle = pool.pin(page_id).expect("pin page");
                black_box(pool.frame_data(handle)[0]);
                pool.unpin(page_id);
            }
        });
    });

    group.finish();
}

fn bench_working_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_pool_working_set");

    let pool_size = 64;
    let (mut pool, _temp) = open_pool(pool_size);
    let page_ids = seed_pages(&mut pool, 100);

    for working_set_size in &[32, 48, 64, 80] {
        let working_set: Vec<_> = page_ids.iter().take(*working_set_size).copied().collect();

        group.throughput(Throughput::Elements(*working_set_size as u64 * 100));
        group.bench_with_input(
            BenchmarkId::from_parameter(working_set_size),
            working_set_size,
            |b, _| {
                b.iter(|| {
                    for _ in 0..100 {
                        for &page_id in &working_set {
                            let handle = pool.pin(page_id).expect("pin page");
                            black_box(pool.frame_data(handle)[0]);
                            pool.unpin(page_id);
                        }
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sequential_access,
    bench_random_access,
    bench_page_write,
    bench_eviction_pressure,
    bench_working_set
);
criterion_main!(benches);
