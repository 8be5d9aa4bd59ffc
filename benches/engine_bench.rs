//! MikroDB - Performance Benchmarks
//! Measures throughput of core engine operations using Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mikrodb::config::Config;
use mikrodb::engine::codec;
use mikrodb::engine::filter::{FieldMatch, FilterExpr, Operator, QueryOptions};
use mikrodb::engine::wal::WriteAheadLog;
use mikrodb::types::{Record, Value, WriteOp, WriteOptions};
use mikrodb::MikroDb;
use std::collections::HashMap;

fn sample_table(count: usize) -> HashMap<String, Record> {
    let mut table = HashMap::new();
    for i in 0..count {
        table.insert(
            format!("key_{i:06}"),
            Record {
                value: Value::Obj(vec![
                    ("name".to_string(), Value::Str(format!("user_{i}"))),
                    ("age".to_string(), Value::I32((i % 80) as i32)),
                ]),
                version: 1,
                timestamp: i as u64,
                expiration: None,
            },
        );
    }
    table
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    group.bench_function("encode_1000", |b| {
        let table = sample_table(1000);
        b.iter(|| black_box(codec::encode_table(table.iter())));
    });

    group.bench_function("decode_1000", |b| {
        let table = sample_table(1000);
        let encoded = codec::encode_table(table.iter());
        b.iter(|| black_box(codec::decode_table(&encoded, 0).unwrap()));
    });

    group.finish();
}

fn bench_wal(c: &mut Criterion) {
    let mut group = c.benchmark_group("wal");

    group.bench_function("append_100", |b| {
        let dir = tempfile::tempdir().unwrap();
        let wal_path = dir.path().join("bench.wal");
        let mut wal = WriteAheadLog::open(wal_path, 100, 10 * 1024, 5 * 1024 * 1024).unwrap();

        b.iter(|| {
            for i in 0..100 {
                wal.append_write("bench", &format!("key_{i:06}"), 1, i as u64, None, Value::I32(i))
                    .unwrap();
            }
            wal.flush().unwrap();
        });
    });

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    group.bench_function("between_scan_1000", |b| {
        let table = sample_table(1000);
        let pairs: Vec<_> = table.into_iter().collect();
        let expr = FilterExpr::new().with_field(
            "age",
            FieldMatch::Condition(Operator::Between, Value::Arr(vec![Value::I32(20), Value::I32(30)])),
        );
        let options = QueryOptions {
            filter: Some(expr),
            ..QueryOptions::new()
        };

        b.iter(|| black_box(mikrodb::engine::filter::apply_query(pairs.clone(), &options)));
    });

    group.finish();
}

fn bench_engine_e2e(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_e2e");

    for size in [100, 500, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("write_get_cycle", size), size, |b, &size| {
            b.iter(|| {
                let dir = tempfile::tempdir().unwrap();
                let config = Config::new(dir.path());
                let mut db = MikroDb::open(config).unwrap();

                for i in 0..size {
                    let op = WriteOp::new("bench", format!("key_{i:06}"), Value::I32(i));
                    db.write(vec![op], WriteOptions::default()).unwrap();
                }

                for i in 0..size {
                    black_box(db.get("bench", Some(&format!("key_{i:06}")), None).unwrap());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_codec, bench_wal, bench_filter, bench_engine_e2e);
criterion_main!(benches);
