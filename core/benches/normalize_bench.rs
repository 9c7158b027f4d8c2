use criterion::{criterion_group, criterion_main, Criterion};
use webidx_core::normalize::normalize;
use webidx_core::tf::TfRecord;

fn bench_normalize(c: &mut Criterion) {
    let text = include_str!("../../README.md");
    c.bench_function("normalize_readme", |b| b.iter(|| normalize(text)));
    c.bench_function("tf_readme", |b| b.iter(|| TfRecord::from_terms(normalize(text).split(' '))));
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
