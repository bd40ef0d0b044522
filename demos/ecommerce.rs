// Generate a small e-commerce dataset as JSON lines and print a per-table summary
//
// Usage: cargo run --example ecommerce -- [output_dir] [orders]

use dgen_tables::{Domain, EcommerceCounts, OutputFormat, Pipeline, PipelineConfig};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let output_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ecommerce-demo"));
    let orders: u64 = match args.next() {
        Some(n) => n.parse()?,
        None => 100_000,
    };

    let config = PipelineConfig {
        output_dir,
        format: OutputFormat::JsonLines,
        domain: Domain::Ecommerce(EcommerceCounts {
            orders,
            ..Default::default()
        }),
        seed: Some(42),
        ..Default::default()
    };

    let report = Pipeline::new(config).run()?;

    println!("{:<16} {:>12}  path", "table", "rows");
    for table in &report.tables {
        println!(
            "{:<16} {:>12}  {}",
            table.table,
            table.rows,
            table.path.display()
        );
    }
    println!(
        "Total: {} rows in {:.2}s (seed {})",
        report.total_rows(),
        report.elapsed.as_secs_f64(),
        report.seed
    );
    Ok(())
}
