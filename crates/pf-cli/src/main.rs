//! pacfilter CLI
//!
//! CLI tool for compiling filter lists into rule bases and checking URLs
//! against them.

use std::path::Path;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pf_core::{BucketId, CompiledBucket, DecisionEngine, MatchSource};

mod bench;
mod rulebase;

use rulebase::Rank;

#[derive(Parser)]
#[command(name = "pf-cli")]
#[command(about = "pacfilter rule compiler and tools")]
struct Cli {
    /// Log every dropped rule (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile filter lists into a rule base
    Compile {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Compiler configuration (JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Output rule base file
        #[arg(short, long, default_value = "rulebase.json")]
        output: String,

        /// Rule priority used for truncation
        #[arg(long, value_enum, default_value_t = Rank::FileOrder)]
        rank: Rank,

        /// Write the build report (JSON) to this file
        #[arg(long)]
        report: Option<String>,
    },

    /// Decide a single URL
    Check {
        /// Compiled rule base
        #[arg(short, long, conflicts_with = "input", required_unless_present = "input")]
        rulebase: Option<String>,

        /// Filter lists to compile on the fly
        #[arg(short, long)]
        input: Vec<String>,

        /// Compiler configuration used with --input
        #[arg(short, long)]
        config: Option<String>,

        /// URL to decide
        #[arg(long)]
        url: String,

        /// Request host (derived from the URL when omitted)
        #[arg(long, default_value = "")]
        host: String,
    },

    /// Dump rule base info
    Info {
        /// Rule base file to inspect
        #[arg(short, long)]
        rulebase: String,
    },

    /// Measure decision latency
    Bench {
        /// Compiled rule base
        #[arg(short, long, conflicts_with = "input", required_unless_present = "input")]
        rulebase: Option<String>,

        /// Filter lists to compile on the fly
        #[arg(short, long)]
        input: Vec<String>,

        /// Compiler configuration used with --input
        #[arg(short, long)]
        config: Option<String>,

        /// Passes over the request set
        #[arg(long, default_value_t = 100)]
        iterations: usize,

        /// Generated requests per pass
        #[arg(long, default_value_t = 1000)]
        requests: usize,

        /// Request generator seed
        #[arg(long, default_value_t = bench::DEFAULT_SEED)]
        seed: u32,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compile {
            input,
            config,
            output,
            rank,
            report,
        } => cmd_compile(
            &input,
            config.as_deref(),
            &output,
            rank,
            report.as_deref(),
            cli.verbose,
        ),
        Commands::Check {
            rulebase,
            input,
            config,
            url,
            host,
        } => cmd_check(rulebase.as_deref(), &input, config.as_deref(), &url, &host),
        Commands::Info { rulebase } => cmd_info(&rulebase),
        Commands::Bench {
            rulebase,
            input,
            config,
            iterations,
            requests,
            seed,
        } => cmd_bench(
            rulebase.as_deref(),
            &input,
            config.as_deref(),
            bench::BenchOptions {
                iterations,
                requests,
                seed,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_compile(
    inputs: &[String],
    config: Option<&str>,
    output: &str,
    rank: Rank,
    report: Option<&str>,
    verbose: bool,
) -> Result<(), String> {
    let config = rulebase::load_config(config)?;
    let compiled = rulebase::compile_rulebase(inputs, &config, rank, verbose)?;
    rulebase::write_rulebase(Path::new(output), &compiled.rulebase)?;
    if let Some(path) = report {
        rulebase::write_report(Path::new(path), &compiled.report)?;
    }

    let drops = &compiled.report.drops;
    println!("Compiled {} filter lists to '{}'", inputs.len(), output);
    println!("  Lines:    {}", drops.lines);
    println!(
        "  Rules:    {} normalized -> {} compiled",
        drops.accepted,
        compiled.report.total_rules()
    );
    println!(
        "  Dropped:  {} selectors, {} ignored options, {} unsupported options, {} ignored sections, {} content filtered",
        drops.selectors,
        drops.ignored_options,
        drops.unsupported_options,
        drops.ignored_sections,
        drops.content_filtered
    );
    println!("  Time:     {:.1}ms", compiled.total_ms);

    if verbose {
        println!();
        for bucket in &compiled.report.buckets {
            if bucket.admitted == 0 {
                continue;
            }
            println!(
                "  {:<28} {:>6} admitted {:>6} unique {:>6} final ({} wildcards)",
                bucket.bucket, bucket.admitted, bucket.unique, bucket.final_count, bucket.wildcards
            );
        }
    }

    Ok(())
}

fn cmd_check(
    rulebase: Option<&str>,
    inputs: &[String],
    config: Option<&str>,
    url: &str,
    host: &str,
) -> Result<(), String> {
    let rulebase = rulebase::obtain_rulebase(rulebase, inputs, config)?;
    let engine = DecisionEngine::new(&rulebase);
    let result = engine.evaluate(url, host);

    let source = match result.source {
        MatchSource::GoodDomainException => "good-domain exception".to_string(),
        MatchSource::PreFilter => "pre-filter".to_string(),
        MatchSource::Bucket(id) => id.name(),
        MatchSource::Default => "default".to_string(),
    };
    println!("{} ({})", result.decision, source);

    Ok(())
}

fn cmd_info(input: &str) -> Result<(), String> {
    let rulebase = rulebase::read_rulebase(Path::new(input))?;

    println!("Rule base: {}", input);
    println!("  Rules:       {}", rulebase.rule_count());
    println!("  Exceptions:  {}", rulebase.good_domain_exceptions().len());
    println!();

    println!("Buckets:");
    for (id, bucket) in rulebase.buckets() {
        println!("  {:<28} {}", id.name(), describe_bucket(id, bucket));
    }

    Ok(())
}

fn describe_bucket(id: BucketId, bucket: &CompiledBucket) -> String {
    match bucket {
        CompiledBucket::Exact(set) => format!("{} entries", set.len()),
        CompiledBucket::Pattern(alternation) if alternation.is_empty() => "empty".to_string(),
        CompiledBucket::Pattern(alternation) => format!(
            "{} alternatives, {} byte regex{}",
            alternation.len(),
            alternation.regex_source().len(),
            if id.category.is_domain_anchored() { ", anchored" } else { "" }
        ),
    }
}

fn cmd_bench(
    rulebase: Option<&str>,
    inputs: &[String],
    config: Option<&str>,
    opts: bench::BenchOptions,
) -> Result<(), String> {
    let rulebase = rulebase::obtain_rulebase(rulebase, inputs, config)?;
    let engine = DecisionEngine::new(&rulebase);
    bench::run(&engine, opts)
}
