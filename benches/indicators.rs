//! Indicator and backtest throughput

use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use macd_backtest::*;

fn closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + (t / 11.0).sin() * 8.0 + (t / 53.0).cos() * 5.0 + t * 0.02
        })
        .collect()
}

fn series(n: usize) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2010, 1, 4).unwrap();
    let bars = closes(n)
        .into_iter()
        .enumerate()
        .map(|(i, c)| PriceBar {
            date: start + Days::new(i as u64),
            open: c,
            high: c * 1.01,
            low: c * 0.99,
            close: c,
            volume: 1_000_000.0,
        })
        .collect();
    PriceSeries::new("BENCH", bars)
}

fn bench_moving_averages(c: &mut Criterion) {
    let mut group = c.benchmark_group("moving_averages");
    for size in [1_000, 10_000] {
        let data = closes(size);
        group.bench_with_input(BenchmarkId::new("sma_20", size), &data, |b, d| {
            b.iter(|| sma(black_box(d), 20))
        });
        group.bench_with_input(BenchmarkId::new("ema_20", size), &data, |b, d| {
            b.iter(|| ema(black_box(d), 20))
        });
        group.bench_with_input(BenchmarkId::new("ewm_mean_20", size), &data, |b, d| {
            b.iter(|| ewm_mean(black_box(d), 20))
        });
    }
    group.finish();
}

fn bench_oscillators(c: &mut Criterion) {
    let data = closes(10_000);
    let highs: Vec<f64> = data.iter().map(|c| c * 1.01).collect();
    let lows: Vec<f64> = data.iter().map(|c| c * 0.99).collect();

    c.bench_function("macd_12_26_9", |b| {
        b.iter(|| macd(black_box(&data), 12, 26, 9, EmaMode::Adjusted))
    });
    c.bench_function("stochastic_14_3", |b| {
        b.iter(|| stochastic(black_box(&highs), black_box(&lows), black_box(&data), 14, 3))
    });
}

fn bench_analyze(c: &mut Criterion) {
    let prices = series(2_500);
    let strategy = StrategyConfig {
        macd: MacdParams::new(10, 20, 7, EmaMode::Adjusted).unwrap(),
        stochastic: Some(StochasticParams::default()),
    };
    let account = BacktestConfig::default();

    c.bench_function("analyze_2500_bars", |b| {
        b.iter(|| analyze(black_box(prices.clone()), &strategy, &account).unwrap())
    });
}

criterion_group!(benches, bench_moving_averages, bench_oscillators, bench_analyze);
criterion_main!(benches);
