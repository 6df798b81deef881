//! 结构编组性能基准测试
//!
//! 每次初始化会话都要编码一次 `ApiInitOptions`，每次版本查询都要解码一次 `CVersionInfo`

use amapi_bridge::abi::{InitOptions, VersionRecord};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_version_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("version_record");
    let record = VersionRecord::new(10, 1, 200, 3, 1);
    let bytes = record.encode();

    group.bench_function("encode", |b| {
        b.iter(|| black_box(record.encode()));
    });

    group.bench_function("decode", |b| {
        b.iter(|| black_box(VersionRecord::decode(black_box(&bytes))));
    });

    group.finish();
}

fn bench_init_options(c: &mut Criterion) {
    let mut group = c.benchmark_group("init_options");
    let options = InitOptions {
        language: "pl".to_string(),
        map_path: "C:\\AutoMapa\\Maps\\Polska.mpi".to_string(),
        profile: "default".to_string(),
        ..InitOptions::default()
    };
    let image = match options.encode() {
        Ok(image) => image,
        Err(e) => panic!("encode failed: {}", e),
    };

    group.bench_function("encode", |b| {
        b.iter(|| black_box(options.encode()));
    });

    group.bench_function("decode", |b| {
        b.iter(|| black_box(InitOptions::decode(black_box(&image))));
    });

    group.finish();
}

criterion_group!(benches, bench_version_record, bench_init_options);
criterion_main!(benches);
