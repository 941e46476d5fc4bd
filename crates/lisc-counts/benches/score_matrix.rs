//! Score Computation Benchmark
//!
//! Measures normalization and association scoring over filled counts
//! matrices of increasing size, plus the lookup-plan layout for single
//! and paired sweeps.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use lisc_core::{CountsMatrix, Dim, ScoreKind, TermSet, build_term_set};
use lisc_counts::{Measure, compute_score, score};
use rand::Rng;

/// Builds a term list of `n` single-synonym terms.
fn term_list(name: &str, n: usize) -> TermSet {
    build_term_set(name, (0..n).map(|i| vec![format!("{name}{i}")]).collect(), None, None)
        .unwrap()
}

/// Fills a paired matrix with random, internally consistent counts.
fn filled_matrix(n_a: usize, n_b: usize, rng: &mut impl Rng) -> CountsMatrix {
    let mut matrix = CountsMatrix::paired(term_list("a", n_a), term_list("b", n_b));

    for i in 0..n_a {
        matrix.marginal_a[i] = Some(rng.gen_range(1..100_000));
    }
    for j in 0..n_b {
        matrix.marginal_b[j] = Some(rng.gen_range(1..100_000));
    }
    for i in 0..n_a {
        for j in 0..n_b {
            let ceiling = matrix.marginal_a[i]
                .unwrap_or(0)
                .min(matrix.marginal_b[j].unwrap_or(0));
            matrix.cooccurrence.set(i, j, Some(rng.gen_range(0..=ceiling)));
        }
    }
    matrix
}

/// Benchmarks association scoring at various matrix sizes
fn association_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("association");
    let mut rng = rand::thread_rng();

    for size in [10, 50, 200, 500] {
        let matrix = filled_matrix(size, size, &mut rng);

        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::new("terms", size), &size, |b, _| {
            b.iter(|| black_box(score(&matrix, ScoreKind::Association).unwrap()))
        });
    }

    group.finish();
}

/// Benchmarks normalization along each axis
fn normalize_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    let mut rng = rand::thread_rng();
    let matrix = filled_matrix(200, 50, &mut rng);

    group.bench_function("by_a", |b| {
        b.iter(|| black_box(compute_score(&matrix, Measure::Normalize, Some(Dim::A)).unwrap()))
    });

    group.bench_function("by_b", |b| {
        b.iter(|| black_box(compute_score(&matrix, Measure::Normalize, Some(Dim::B)).unwrap()))
    });

    group.finish();
}

/// Benchmarks lookup-plan layout for single and paired sweeps
fn plan_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");

    for size in [10, 100, 500] {
        let single = CountsMatrix::single(term_list("t", size));
        let paired = CountsMatrix::paired(term_list("a", size), term_list("b", size));

        group.bench_with_input(BenchmarkId::new("single", size), &size, |b, _| {
            b.iter(|| black_box(single.plan()))
        });
        group.bench_with_input(BenchmarkId::new("paired", size), &size, |b, _| {
            b.iter(|| black_box(paired.plan()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    association_benchmark,
    normalize_benchmark,
    plan_benchmark,
);
criterion_main!(benches);
