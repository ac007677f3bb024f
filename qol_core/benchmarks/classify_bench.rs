//! Criterion benchmarks for scale building and classification.
//!
//! Run with: cargo bench -p qol_core --bench classify_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use qol_core::{build_scale, classify, propagate, score, Binning, ColorMode};

fn sample_readings(count: usize) -> Vec<Option<f64>> {
    (0..count)
        .map(|idx| {
            if idx % 17 == 0 {
                None
            } else {
                Some(((idx * 7919) % 1000) as f64 / 10.0)
            }
        })
        .collect()
}

fn bench_build_scale(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_scale");
    let readings = sample_readings(64);

    group.bench_function("continuous_64", |b| {
        b.iter(|| black_box(build_scale(black_box(&readings), ColorMode::Continuous)));
    });
    for binning in [Binning::EqualInterval, Binning::Quantile] {
        let mode = ColorMode::Discrete { classes: 7, binning };
        group.bench_function(format!("{binning:?}_7_classes_64"), |b| {
            b.iter(|| black_box(build_scale(black_box(&readings), mode)));
        });
    }
    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let readings = sample_readings(1024);
    let scale = build_scale(
        &readings,
        ColorMode::Discrete {
            classes: 9,
            binning: Binning::Quantile,
        },
    );
    c.bench_function("classify_1024_quantile", |b| {
        b.iter(|| {
            for value in &readings {
                black_box(classify(black_box(*value), &scale));
            }
        });
    });
}

fn bench_scenario(c: &mut Criterion) {
    c.bench_function("propagate_and_score", |b| {
        b.iter(|| black_box(score(&propagate(black_box(7)))));
    });
}

criterion_group!(benches, bench_build_scale, bench_classify, bench_scenario);
criterion_main!(benches);
