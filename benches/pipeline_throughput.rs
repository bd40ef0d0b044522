// Benchmark for end-to-end pipeline throughput
// Runs every domain at increasing worker counts and reports rows/s

use anyhow::Context;
use dgen_tables::{
    Domain, EcommerceCounts, FinancialCounts, MedicalCounts, OutputFormat, Pipeline,
    PipelineConfig,
};
use std::path::Path;
use std::time::Instant;

const ORDERS: u64 = 2_000_000;
const TRADING_DAYS: u64 = 250;
const APPOINTMENTS: u64 = 2_000_000;
const ITERATIONS: usize = 3;

fn domains() -> Vec<Domain> {
    vec![
        Domain::Ecommerce(EcommerceCounts {
            orders: ORDERS,
            ..Default::default()
        }),
        Domain::Financial(FinancialCounts {
            trading_days: TRADING_DAYS,
            ..Default::default()
        }),
        Domain::Medical(MedicalCounts {
            appointments: APPOINTMENTS,
            ..Default::default()
        }),
    ]
}

fn benchmark_domain(domain: Domain, threads: usize, out: &Path) -> anyhow::Result<()> {
    println!("\n{}", "=".repeat(80));
    println!("Domain = {} | threads = {}", domain.name(), threads);
    println!("{}", "=".repeat(80));

    let mut run_times = Vec::new();
    let mut rows = 0;

    for i in 1..=ITERATIONS {
        let config = PipelineConfig {
            output_dir: out.join(domain.name()),
            format: OutputFormat::Csv,
            domain: domain.clone(),
            max_threads: Some(threads),
            seed: Some(i as u64),
            ..Default::default()
        };

        let start = Instant::now();
        let report = Pipeline::new(config)
            .run()
            .with_context(|| format!("{} run {} failed", domain.name(), i))?;
        let duration_secs = start.elapsed().as_secs_f64();

        rows = report.total_rows();
        run_times.push(duration_secs);
        println!(
            "Run {:02}: {:.4} seconds | {:.2} M rows/s",
            i,
            duration_secs,
            rows as f64 / duration_secs / 1e6
        );
    }

    let avg_duration = run_times.iter().sum::<f64>() / ITERATIONS as f64;
    println!(
        "AVERAGE: {:.4} seconds | {:.2} M rows/s ({} rows)",
        avg_duration,
        rows as f64 / avg_duration / 1e6,
        rows
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("RUST PIPELINE THROUGHPUT BENCHMARK");
    println!("Iterations: {}", ITERATIONS);
    println!();
    println!("System Configuration:");
    println!("  Physical cores: {}", num_cpus::get_physical());
    println!("  Logical CPUs: {}", num_cpus::get());
    println!();

    let out = std::env::temp_dir().join(format!("dgen-tables-bench-{}", std::process::id()));
    let max_threads = dgen_tables::config::get_affinity_cpu_count();
    let mut thread_counts: Vec<usize> = [1, 4, max_threads]
        .into_iter()
        .filter(|&t| t <= max_threads)
        .collect();
    thread_counts.dedup();

    let result = domains().into_iter().try_for_each(|domain| {
        thread_counts
            .iter()
            .try_for_each(|&threads| benchmark_domain(domain.clone(), threads, &out))
    });

    if out.exists() {
        std::fs::remove_dir_all(&out)
            .with_context(|| format!("failed to remove {}", out.display()))?;
    }
    result
}
