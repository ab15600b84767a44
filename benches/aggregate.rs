//! Benchmarks for per-step aggregation

use candle_sandbox::aggregate::{aggregate, BucketAggregator};
use candle_sandbox::candle::{Bar, Timeframe};
use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn bars(n: i64) -> Vec<Bar> {
    (0..n)
        .map(|m| {
            let ts = Utc.timestamp_opt(1_749_340_800 + m * 60, 0).unwrap();
            let c = dec!(105000) + Decimal::from(m % 97);
            Bar::new(ts, c, c + dec!(5), c - dec!(5), c, dec!(0.5))
        })
        .collect()
}

/// Recompute the full aggregation after every revealed bar
fn benchmark_from_scratch(c: &mut Criterion) {
    let data = bars(2_000);
    let tf = Timeframe::from_minutes(60).unwrap();

    c.bench_function("aggregate_from_scratch_2000", |b| {
        b.iter(|| {
            for len in 1..=data.len() {
                black_box(aggregate(black_box(&data[..len]), tf));
            }
        })
    });
}

/// Fold each revealed bar into a running aggregator
fn benchmark_incremental(c: &mut Criterion) {
    let data = bars(2_000);
    let tf = Timeframe::from_minutes(60).unwrap();

    c.bench_function("aggregate_incremental_2000", |b| {
        b.iter(|| {
            let mut agg = BucketAggregator::new(tf);
            for bar in &data {
                agg.push(black_box(bar)).unwrap();
                black_box(agg.tail(48));
            }
        })
    });
}

criterion_group!(benches, benchmark_from_scratch, benchmark_incremental);
criterion_main!(benches);
