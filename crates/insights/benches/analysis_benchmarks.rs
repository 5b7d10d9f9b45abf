//! Analyzer set and ranking performance benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use insights::{AnalyzerSet, CancelFlag, InsightConfig, Parser};
use std::sync::Arc;

/// Generate a sales-like CSV with numeric, categorical, date and text columns.
fn generate_sales_data(rows: usize) -> String {
    let mut data = String::new();
    data.push_str("order_id,region,order_date,units,unit_price,revenue,discount,notes\n");

    let regions = ["north", "south", "east", "west"];

    for row in 0..rows {
        let units = 1 + (row * 7) % 40;
        let price = 5.0 + (row % 13) as f64 * 1.25;
        // Occasional spike and gaps
        let revenue = if row % 97 == 0 {
            units as f64 * price * 50.0
        } else {
            units as f64 * price
        };
        let discount = if row % 5 == 0 {
            String::new()
        } else {
            format!("{:.2}", (row % 10) as f64 / 100.0)
        };

        data.push_str(&format!(
            "ORD{:06},{},2024-{:02}-{:02},{},{:.2},{:.2},{},note {}\n",
            row,
            regions[row % regions.len()],
            (row % 12) + 1,
            (row % 28) + 1,
            units,
            price,
            revenue,
            discount,
            row
        ));
    }

    data
}

/// Benchmark parsing plus type inference.
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_sales_data(*rows);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("csv_rows", rows), &data, |b, data| {
            b.iter(|| black_box(Parser::new().parse(data.as_bytes(), "csv").unwrap()))
        });
    }

    group.finish();
}

/// Benchmark the analyzer set on the current thread.
fn bench_analyze_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_all");
    let config = InsightConfig::default();
    let set = AnalyzerSet::new(&config.analysis);

    for rows in [100, 1_000, 10_000].iter() {
        let dataset = Parser::new()
            .parse(generate_sales_data(*rows).as_bytes(), "csv")
            .unwrap();
        group.bench_with_input(BenchmarkId::new("rows", rows), &dataset, |b, dataset| {
            b.iter(|| black_box(set.analyze_all(dataset).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark the concurrent run against the sequential one.
fn bench_parallel_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_run");
    group.sample_size(20);

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let dataset = Arc::new(
        Parser::new()
            .parse(generate_sales_data(50_000).as_bytes(), "csv")
            .unwrap(),
    );

    for parallel in [false, true] {
        let mut analysis = InsightConfig::default().analysis;
        analysis.parallel = parallel;
        let set = AnalyzerSet::new(&analysis);

        group.bench_function(if parallel { "parallel" } else { "sequential" }, |b| {
            b.iter(|| {
                let cancel = CancelFlag::new();
                black_box(
                    runtime
                        .block_on(set.run(Arc::clone(&dataset), &cancel))
                        .unwrap(),
                )
            })
        });
    }

    group.finish();
}

/// Benchmark the full synchronous pipeline including ranking.
fn bench_generate_insights(c: &mut Criterion) {
    let config = InsightConfig::default();
    let dataset = Parser::new()
        .parse(generate_sales_data(10_000).as_bytes(), "csv")
        .unwrap();

    c.bench_function("generate_insights_10k", |b| {
        b.iter(|| black_box(insights::generate_insights(&dataset, &config).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_analyze_all,
    bench_parallel_run,
    bench_generate_insights
);
criterion_main!(benches);
