use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use flapjack_rust::signal::{lowess, savgol};

fn noisy_series(n: usize) -> (Vec<f64>, Vec<f64>) {
    let xs: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
    // Deterministic pseudo-noise on a slow sine.
    let ys: Vec<f64> = xs
        .iter()
        .enumerate()
        .map(|(i, &x)| (x * 0.3).sin() + 0.05 * ((i * 2654435761) % 1000) as f64 / 1000.0)
        .collect();
    (xs, ys)
}

fn bench_savgol(c: &mut Criterion) {
    let mut group = c.benchmark_group("SavitzkyGolay");

    for n in [100, 1000, 10_000] {
        let (_, ys) = noisy_series(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| savgol::savgol_filter(&ys, 21, 2, 0, 1.0).unwrap());
        });
    }
    group.finish();
}

fn bench_savgol_derivative(c: &mut Criterion) {
    let mut group = c.benchmark_group("SavitzkyGolay_Derivative");

    for n in [100, 1000, 10_000] {
        let (_, ys) = noisy_series(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| savgol::savgol_filter(&ys, 21, 2, 1, 1.0).unwrap());
        });
    }
    group.finish();
}

fn bench_lowess(c: &mut Criterion) {
    let mut group = c.benchmark_group("Lowess");

    for n in [100, 1000] {
        let (xs, ys) = noisy_series(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| lowess::lowess(&xs, &ys, 0.2).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_savgol, bench_savgol_derivative, bench_lowess);
criterion_main!(benches);
