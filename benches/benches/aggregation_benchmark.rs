//! Aggregation throughput benchmarks.
//!
//! Run with: `cargo bench --package tickbars-bench`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tickbars_bench::{generate_bars, generate_series};
use tickbars_lib::{
    AggregationSession, BarAccumulator, BarDrawing, CsvFormatter, Formatter, Granularity,
    GranularityRegistry, InMemoryMarket, OutputSeries, SessionConfig, VecSeries,
};

const BAR_COUNTS: [usize; 3] = [1_000, 10_000, 100_000];

fn accumulator_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulator");

    for count in BAR_COUNTS {
        let bars = generate_bars(count, 100);
        group.throughput(Throughput::Elements(count as u64));

        for ratio in [2u32, 10, 100] {
            group.bench_with_input(
                BenchmarkId::new(format!("ratio-{ratio}"), count),
                &bars,
                |b, bars| {
                    b.iter(|| {
                        let mut accumulator = BarAccumulator::new(ratio);
                        for bar in bars {
                            accumulator.on_new_source_bar(bar).unwrap();
                        }
                        black_box(accumulator.finish().len())
                    });
                },
            );
        }
    }

    group.finish();
}

fn session_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");

    for count in BAR_COUNTS {
        group.throughput(Throughput::Elements(count as u64));

        // Tick5 chart folded into Tick50 bars.
        group.bench_with_input(BenchmarkId::new("from-chart", count), &count, |b, &count| {
            b.iter_batched(
                || generate_series("Tick5", count, 500),
                |chart| {
                    let mut session: AggregationSession<VecSeries, VecSeries> =
                        AggregationSession::start(
                            SessionConfig::new(50),
                            chart,
                            GranularityRegistry::global(),
                            &mut InMemoryMarket::new(),
                        )
                        .unwrap();
                    let mut outputs = OutputSeries::with_len(count);
                    session.process_pending(&mut (), &mut outputs).unwrap();
                    black_box(session.finish().len())
                },
                criterion::BatchSize::LargeInput,
            );
        });

        // Tick4 chart fed by a Tick3 stream folded into Tick6 bars.
        group.bench_with_input(BenchmarkId::new("requested-stream", count), &count, |b, &count| {
            b.iter_batched(
                || {
                    let chart = generate_series("Tick4", count, 400);
                    let finer = generate_series("Tick3", count * 4 / 3 + 1, 300);
                    let market =
                        InMemoryMarket::new().with_series(Granularity::new(3).unwrap(), finer);
                    (chart, market)
                },
                |(chart, mut market)| {
                    let catalog = market.granularities();
                    let mut session: AggregationSession<VecSeries, VecSeries> =
                        AggregationSession::start(
                            SessionConfig::new(6),
                            chart,
                            catalog,
                            &mut market,
                        )
                        .unwrap();
                    let mut outputs = OutputSeries::with_len(count);
                    let mut drawings: Vec<BarDrawing> = Vec::new();
                    session.process_pending(&mut drawings, &mut outputs).unwrap();
                    black_box(drawings.len())
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn format_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("format");
    let count = 100_000;

    let mut accumulator = BarAccumulator::new(10);
    for bar in generate_bars(count, 100) {
        accumulator.on_new_source_bar(&bar).unwrap();
    }
    let bars = accumulator.finish();
    group.throughput(Throughput::Elements(bars.len() as u64));

    group.bench_function("csv-file", |b| {
        b.iter(|| {
            let file = tempfile::tempfile().unwrap();
            CsvFormatter::new()
                .write_bars(bars.as_slice(), std::io::BufWriter::new(file))
                .unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    accumulator_benchmark,
    session_benchmark,
    format_benchmark
);
criterion_main!(benches);
