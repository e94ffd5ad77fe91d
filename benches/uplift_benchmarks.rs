use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use uplift_roi::calibration::isotonic::IsotonicCalibrator;
use uplift_roi::classifier::ProbabilisticClassifier;
use uplift_roi::data::Matrix;
use uplift_roi::forest::{ForestConfig, RandomForestClassifier};
use uplift_roi::metrics::uplift::{qini_auc, qini_curve, uplift_at_k};
use uplift_roi::roi::simulate_roi;

fn synthetic(n: usize, cols: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(0);
    let data: Vec<f64> = (0..n * cols).map(|_| rng.gen()).collect();
    let y: Vec<f64> = (0..n)
        .map(|i| if rng.gen::<f64>() < data[i] { 1.0 } else { 0.0 })
        .collect();
    let t: Vec<f64> = (0..n).map(|i| (i % 2) as f64).collect();
    (data, y, t)
}

pub fn metric_benchmarks(c: &mut Criterion) {
    let (data, y, t) = synthetic(100_000, 1);
    let scores: Vec<f64> = data.iter().map(|v| v - 0.5).collect();

    c.bench_function("qini_curve", |b| {
        b.iter(|| qini_curve(black_box(&y), black_box(&scores), black_box(&t)))
    });
    let curve = qini_curve(&y, &scores, &t).unwrap();
    c.bench_function("qini_auc", |b| {
        b.iter(|| qini_auc(black_box(&curve.phi), black_box(&curve.qini), black_box(&t), black_box(&y)))
    });
    c.bench_function("uplift_at_k", |b| {
        b.iter(|| uplift_at_k(black_box(&y), black_box(&t), black_box(&scores), black_box(0.1)))
    });
    c.bench_function("simulate_roi", |b| {
        b.iter(|| {
            simulate_roi(
                black_box(&y),
                black_box(&t),
                black_box(&scores),
                black_box(&[0.05, 0.1, 0.2, 0.3, 1.0]),
                15.0,
                0.1,
            )
        })
    });
    c.bench_function("isotonic_fit", |b| {
        b.iter(|| IsotonicCalibrator::new(black_box(&scores), black_box(&y)))
    });
}

pub fn forest_benchmarks(c: &mut Criterion) {
    let (data, y, _) = synthetic(10_000, 8);
    let matrix = Matrix::new(&data, y.len(), 8);
    let cfg = ForestConfig {
        n_estimators: 50,
        max_depth: Some(6),
        ..Default::default()
    };

    let mut group = c.benchmark_group("forest");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));
    group.bench_function("fit_50_trees", |b| {
        b.iter(|| {
            let mut model = RandomForestClassifier::new(cfg.clone()).unwrap();
            model.fit(black_box(&matrix), black_box(&y)).unwrap();
        })
    });
    let mut model = RandomForestClassifier::new(cfg.clone()).unwrap();
    model.fit(&matrix, &y).unwrap();
    group.bench_function("predict_proba", |b| b.iter(|| model.predict_proba(black_box(&matrix))));
    group.finish();
}

criterion_group!(benches, metric_benchmarks, forest_benchmarks);
criterion_main!(benches);
