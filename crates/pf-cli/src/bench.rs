use std::cmp::Ordering;
use std::time::Instant;

use pf_core::{Decision, DecisionEngine};

pub struct BenchOptions {
    pub iterations: usize,
    pub requests: usize,
    pub seed: u32,
}

struct BenchRequest {
    url: String,
    host: String,
}

struct BenchResult {
    ops: usize,
    total_ms: f64,
    avg_us: f64,
    p50_us: f64,
    p95_us: f64,
    p99_us: f64,
    ops_per_sec: u64,
    blocked_pct: f64,
}

pub const DEFAULT_SEED: u32 = 0xc0ffee;

pub fn run(engine: &DecisionEngine<'_>, opts: BenchOptions) -> Result<(), String> {
    if opts.iterations == 0 || opts.requests == 0 {
        return Err("Iterations and requests must be non-zero".to_string());
    }

    println!("============================================================");
    println!("pacfilter Decision Benchmark");
    println!("============================================================");
    println!("Rules: {}", engine.rulebase().rule_count());
    println!("Requests: {}", opts.requests);
    println!("Iterations: {}", opts.iterations);
    println!();

    let requests = generate_requests(opts.requests, opts.seed);

    println!("Warming up...");
    for req in &requests {
        let _ = engine.decide(&req.url, &req.host);
    }

    let result = measure(engine, &requests, opts.iterations);
    println!("{}", format_result("Random Requests", &result));
    println!();

    let hot = &requests[..1];
    let result = measure(engine, hot, opts.iterations.saturating_mul(10));
    println!("{}", format_result("Single Hot Path", &result));

    Ok(())
}

fn measure(
    engine: &DecisionEngine<'_>,
    requests: &[BenchRequest],
    iterations: usize,
) -> BenchResult {
    let mut latencies = Vec::with_capacity(requests.len() * iterations);
    let mut blocked = 0usize;

    for _ in 0..iterations {
        for req in requests {
            let start = Instant::now();
            let decision = engine.decide(&req.url, &req.host);
            latencies.push(start.elapsed().as_secs_f64() * 1_000_000.0);
            if decision == Decision::Block {
                blocked += 1;
            }
        }
    }

    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let ops = latencies.len();
    let total_us: f64 = latencies.iter().sum();
    let total_ms = total_us / 1000.0;

    BenchResult {
        ops,
        total_ms,
        avg_us: if ops == 0 { 0.0 } else { total_us / ops as f64 },
        p50_us: percentile(&latencies, 0.50),
        p95_us: percentile(&latencies, 0.95),
        p99_us: percentile(&latencies, 0.99),
        ops_per_sec: if total_ms > 0.0 { (ops as f64 / (total_ms / 1000.0)) as u64 } else { 0 },
        blocked_pct: if ops == 0 { 0.0 } else { blocked as f64 * 100.0 / ops as f64 },
    }
}

fn format_result(name: &str, result: &BenchResult) -> String {
    format!(
        "{}:\n  Ops: {}\n  Total: {:.2} ms\n  Avg: {:.2} us\n  P50: {:.2} us\n  P95: {:.2} us\n  P99: {:.2} us\n  Throughput: {} ops/sec\n  Blocked: {:.1}%",
        name,
        result.ops,
        result.total_ms,
        result.avg_us,
        result.p50_us,
        result.p95_us,
        result.p99_us,
        result.ops_per_sec,
        result.blocked_pct,
    )
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64) * p).ceil() as usize;
    let idx = idx.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx]
}

fn create_rng(seed: u32) -> impl FnMut() -> f64 {
    let mut state = seed;
    move || {
        state = state.wrapping_mul(1664525).wrapping_add(1013904223);
        (state as f64) / (u32::MAX as f64)
    }
}

fn pick<'a>(items: &[&'a str], rand: &mut impl FnMut() -> f64) -> &'a str {
    let idx = (rand() * items.len() as f64).floor() as usize;
    items[idx.min(items.len() - 1)]
}

fn generate_requests(count: usize, seed: u32) -> Vec<BenchRequest> {
    const AD_DOMAINS: &[&str] = &[
        "ads.example.com",
        "tracking.example.com",
        "analytics.test.com",
        "doubleclick.net",
        "googlesyndication.com",
        "pagead2.googlesyndication.com",
        "google-analytics.com",
        "metrics.example.com",
    ];
    const CLEAN_DOMAINS: &[&str] = &[
        "example.com",
        "github.com",
        "stackoverflow.com",
        "wikipedia.org",
        "mozilla.org",
        "news.example.co.uk",
    ];
    const PATHS: &[&str] = &[
        "/",
        "/index.html",
        "/assets/main.js",
        "/api/v1/data?id=42",
        "/images/logo.png",
        "/ads/banner.gif",
        "/tracking/pixel.gif?u=1&t=2",
        "/analytics.js",
        "/beacon.js",
    ];
    const SCHEMES: &[&str] = &["https", "https", "http"];

    let mut rng = create_rng(seed);

    (0..count)
        .map(|_| {
            let domain = if rng() < 0.3 {
                pick(AD_DOMAINS, &mut rng)
            } else {
                pick(CLEAN_DOMAINS, &mut rng)
            };
            let scheme = pick(SCHEMES, &mut rng);
            let path = pick(PATHS, &mut rng);
            BenchRequest {
                url: format!("{scheme}://{domain}{path}"),
                host: domain.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.5), 2.0);
        assert_eq!(percentile(&values, 0.99), 4.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_requests_are_deterministic() {
        let a = generate_requests(20, DEFAULT_SEED);
        let b = generate_requests(20, DEFAULT_SEED);
        assert!(a.iter().zip(&b).all(|(x, y)| x.url == y.url && x.host == y.host));
        assert!(a.iter().all(|req| req.url.contains(&req.host)));
    }
}
