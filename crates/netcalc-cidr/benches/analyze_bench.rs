use criterion::{black_box, criterion_group, criterion_main, Criterion};
use netcalc_cidr::{analyze, expand_range};

fn benchmark_analyze(c: &mut Criterion) {
    c.bench_function("analyze_slash_24", |b| {
        b.iter(|| analyze(black_box("192.168.1.77/24")))
    });

    c.bench_function("analyze_default_prefix", |b| {
        b.iter(|| analyze(black_box("10.20.30.40")))
    });
}

fn benchmark_expand(c: &mut Criterion) {
    c.bench_function("expand_range_straddling", |b| {
        b.iter(|| expand_range(black_box("192.168.1.30"), black_box("192.168.1.33")))
    });
}

criterion_group!(benches, benchmark_analyze, benchmark_expand);
criterion_main!(benches);
