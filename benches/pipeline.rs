//! Pipeline benchmarks
//!
//! Measures normalization, preprocessing and the offline decision path.

use chrono::{NaiveDate, NaiveDateTime};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rootcause::config::Config;
use rootcause::log_analysis::{normalize_at, MetricSnapshot};
use rootcause::pipeline::{lines_to_inputs, Pipeline};
use std::hint::black_box;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn sample_lines(n: usize) -> Vec<String> {
    let templates = [
        "[2024-01-15 10:{m:02}:{s:02}] production.ERROR: Database connection timeout",
        "2024-01-15 10:{m:02}:{s:02} WARNING: Slow query on orders ({i}ms)",
        "[2024-01-15 10:{m:02}:{s:02}] request {i} served",
        "worker {i} exited with fatal signal",
    ];
    (0..n)
        .map(|i| {
            templates[i % templates.len()]
                .replace("{m:02}", &format!("{:02}", (i / 60) % 60))
                .replace("{s:02}", &format!("{:02}", i % 60))
                .replace("{i}", &i.to_string())
        })
        .collect()
}

fn normalize_benchmark(c: &mut Criterion) {
    let lines = sample_lines(4);
    let mut group = c.benchmark_group("normalize");
    for (i, line) in lines.iter().enumerate() {
        group.bench_with_input(BenchmarkId::new("format", i), line, |b, line| {
            b.iter(|| normalize_at(black_box(line), now()))
        });
    }
    group.finish();
}

fn offline_pipeline_benchmark(c: &mut Criterion) {
    let pipeline = Pipeline::offline(&Config::default());
    let metrics = MetricSnapshot::new()
        .with_cpu(85.0)
        .with_db_latency(450.0)
        .with_requests_per_sec(1200);

    let mut group = c.benchmark_group("offline_pipeline");
    for size in [100usize, 1_000, 10_000] {
        let lines = sample_lines(size);
        group.bench_with_input(BenchmarkId::new("lines", size), &lines, |b, lines| {
            b.iter(|| {
                let inputs = lines_to_inputs(black_box(lines), now());
                pipeline.analyze_offline_at(&inputs, &metrics, now())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, normalize_benchmark, offline_pipeline_benchmark);
criterion_main!(benches);
