//! Criterion benchmarks for NRRD I/O.
//!
//! Run with: cargo bench --bench nrrd_io
//!
//! Tracks regression in the core codec paths:
//! - write() per encoding
//! - read() per encoding

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::{ArrayD, IxDyn};
use nrrd::{read, write, FieldValue, NrrdArray, NrrdHeader, ReadOptions, WriteOptions};
use tempfile::tempdir;

const SHAPE: [usize; 3] = [64, 64, 64];
const ENCODINGS: [&str; 4] = ["raw", "gzip", "bzip2", "ascii"];

fn test_volume() -> NrrdArray {
    let count: usize = SHAPE.iter().product();
    let values: Vec<f32> = (0..count).map(|i| (i % 256) as f32).collect();
    ArrayD::from_shape_vec(IxDyn(&SHAPE), values).unwrap().into()
}

fn encoded_header(encoding: &str) -> NrrdHeader {
    let mut header = NrrdHeader::new();
    header.insert("encoding", FieldValue::String(encoding.to_string()));
    header
}

fn bench_write(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let volume = test_volume();
    let payload_bytes = (volume.len() * 4) as u64;

    let mut group = c.benchmark_group("write");
    group.throughput(Throughput::Bytes(payload_bytes));
    for encoding in ENCODINGS {
        let path = dir.path().join(format!("bench_{encoding}.nrrd"));
        group.bench_with_input(
            BenchmarkId::from_parameter(encoding),
            &encoding,
            |b, &encoding| {
                b.iter(|| {
                    write(
                        black_box(&path),
                        black_box(&volume),
                        &encoded_header(encoding),
                        &WriteOptions::default(),
                    )
                    .unwrap()
                });
            },
        );
    }
    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let volume = test_volume();
    let payload_bytes = (volume.len() * 4) as u64;

    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Bytes(payload_bytes));
    for encoding in ENCODINGS {
        let path = dir.path().join(format!("bench_{encoding}.nrrd"));
        write(&path, &volume, &encoded_header(encoding), &WriteOptions::default()).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(encoding),
            &encoding,
            |b, _| {
                b.iter(|| read(black_box(&path), &ReadOptions::default()).unwrap());
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_write, bench_read);
criterion_main!(benches);
