//! Compile and lookup benchmarks.
//!
//! Run with: `cargo bench -p pf-compiler -- decide`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use pf_compiler::{compile_sources, CompilerConfig};
use pf_core::DecisionEngine;

// ============================================================================
// Test Data Generation
// ============================================================================

/// A rule source mixing every bucket shape.
fn generate_rules(count: usize) -> String {
    let mut out = String::new();
    for i in 0..count {
        let rule = match i % 8 {
            0 => format!("||ads{i}.example.com^"),
            1 => format!("||track{i}.example.net/pixel.gif"),
            2 => format!("||cdn{i}.*.example.org^"),
            3 => format!("||stats{i}.example.com/*/beacon^"),
            4 => format!("||analytics{i}.example.com/collect?id=*&v=1"),
            5 => format!("/banner{i}/*/ad_"),
            6 => format!("/ads{i}\\d+\\.gif/"),
            _ => format!("@@||ok{i}.example.com^"),
        };
        out.push_str(&rule);
        out.push('\n');
    }
    out
}

fn generate_lookups(count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|i| {
            let host = match i % 4 {
                0 => format!("ads{i}.example.com"),
                1 => format!("www{i}.news.example"),
                2 => format!("cdn{}.shard.example.org", i % 97),
                _ => format!("ok{i}.example.com"),
            };
            let url = match i % 3 {
                0 => format!("https://{host}/"),
                1 => format!("https://{host}/banner{}/x/ad_1.png?q={i}", i % 31),
                _ => format!("http://{host}/index.html"),
            };
            (url, host)
        })
        .collect()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    let config = CompilerConfig::default();

    for count in [1_000, 10_000] {
        let source = generate_rules(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &source, |b, source| {
            b.iter(|| compile_sources(&config, &[source.as_str()]).unwrap())
        });
    }

    group.finish();
}

fn bench_decide(c: &mut Criterion) {
    let mut group = c.benchmark_group("decide");
    let lookups = generate_lookups(1_000);

    for count in [1_000, 10_000] {
        let (rulebase, _) =
            compile_sources(&CompilerConfig::default(), &[generate_rules(count)]).unwrap();
        let engine = DecisionEngine::new(&rulebase);

        group.throughput(Throughput::Elements(lookups.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &lookups, |b, lookups| {
            b.iter(|| {
                for (url, host) in lookups {
                    black_box(engine.decide(black_box(url), black_box(host)));
                }
            })
        });
    }

    group.finish();
}

criterion_group!(
    name = decide_benchmarks;
    config = Criterion::default()
        .sample_size(30)
        .measurement_time(std::time::Duration::from_secs(3));
    targets = bench_compile, bench_decide
);

criterion_main!(decide_benchmarks);
