//! Typed buffer and marshalling benchmarks
//!
//! Measures append growth, search and host conversions.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pyrt::host::arena::ObjectArena;
use pyrt::host::HostApi;
use pyrt::{marshal, ElementKind, MemoryOrder, TypedBuffer};

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");

    for size in [16usize, 256, 4096].iter() {
        group.bench_with_input(BenchmarkId::new("single_elements", size), size, |b, &size| {
            let single = TypedBuffer::from_slice(&[7i64]).unwrap();
            b.iter(|| {
                let mut buffer = TypedBuffer::new(ElementKind::Int64).unwrap();
                for _ in 0..size {
                    buffer.append(black_box(&single)).unwrap();
                }
                buffer
            });
        });

        group.bench_with_input(BenchmarkId::new("one_block", size), size, |b, &size| {
            let values: Vec<f64> = (0..size).map(|i| i as f64).collect();
            let block = TypedBuffer::from_slice(&values).unwrap();
            b.iter(|| {
                let mut buffer = TypedBuffer::new(ElementKind::Float64).unwrap();
                buffer.append(black_box(&block)).unwrap();
                buffer
            });
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let values: Vec<i32> = (0..4096).collect();
    let buffer = TypedBuffer::from_slice(&values).unwrap();
    let needle = 4000i32.to_ne_bytes();

    c.bench_function("find_first_4096", |b| {
        b.iter(|| buffer.find_first(black_box(&needle)).unwrap());
    });

    c.bench_function("count_equal_4096", |b| {
        b.iter(|| buffer.count_equal(black_box(&needle)).unwrap());
    });
}

fn bench_marshal(c: &mut Criterion) {
    let host = ObjectArena::new();

    c.bench_function("int64_roundtrip", |b| {
        b.iter(|| {
            let obj = marshal::from_int64(&host, black_box(42)).unwrap();
            let value = marshal::to_int64(&host, obj).unwrap();
            host.decref(obj);
            value
        });
    });

    let values: Vec<f64> = (0..1024).map(|i| i as f64).collect();
    let array = host.array(&[32, 32], &values, MemoryOrder::RowMajor);
    c.bench_function("array_view_32x32", |b| {
        b.iter(|| unsafe { marshal::to_array_descriptor(&host, black_box(array)).unwrap() });
    });
}

criterion_group!(benches, bench_append, bench_search, bench_marshal);
criterion_main!(benches);
