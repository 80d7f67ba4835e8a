//! Benchmark: Field Resolution
//!
//! Measures memoized reads, cascade invalidation and re-rendering over
//! chains of dependent fields.
//! Run: cargo bench --bench field_resolution

use bitsmith::{FieldValue, KindBuilder, Submission, SubmissionKind};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

/// `f0` is a literal, `f{i}` reads `f{i-1}` and appends one character
fn chain_kind(len: usize) -> Arc<SubmissionKind> {
    let mut builder = KindBuilder::new("chain");
    for i in 1..=len {
        let prev = format!("f{}", i - 1);
        builder = builder.render(&format!("f{i}"), move |s| {
            let value = s.get(&prev)?;
            Ok(FieldValue::text(format!("{value}.")))
        });
    }
    builder.build(None)
}

fn chain_submission(len: usize) -> Submission {
    Submission::with_literals(chain_kind(len), [("f0", "x")])
}

fn bench_memoized_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("memoized_get");

    for len in [10, 50, 200].iter() {
        let mut sub = chain_submission(*len);
        let top = format!("f{len}");
        sub.get(&top).unwrap();

        group.bench_with_input(BenchmarkId::new("chain", len), &top, |b, top| {
            b.iter(|| {
                let value = sub.get(black_box(top)).unwrap();
                black_box(value)
            });
        });
    }

    group.finish();
}

fn bench_cold_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("cold_resolution");

    for len in [10, 50, 200].iter() {
        let kind = chain_kind(*len);
        let top = format!("f{len}");

        group.bench_with_input(BenchmarkId::new("chain", len), &top, |b, top| {
            b.iter(|| {
                let mut sub = Submission::with_literals(Arc::clone(&kind), [("f0", "x")]);
                black_box(sub.get(black_box(top)).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_invalidate_and_rerender(c: &mut Criterion) {
    let mut group = c.benchmark_group("invalidate_and_rerender");

    for len in [10, 50, 200].iter() {
        let mut sub = chain_submission(*len);
        let top = format!("f{len}");
        sub.get(&top).unwrap();

        group.bench_with_input(BenchmarkId::new("chain", len), &top, |b, top| {
            b.iter(|| {
                sub.set("f0", black_box("y"));
                black_box(sub.get(top).unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_memoized_get,
    bench_cold_resolution,
    bench_invalidate_and_rerender,
);
criterion_main!(benches);
