// src/pipeline/mod.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pipeline coordinator
//!
//! A run goes through fixed phases:
//! 1. validate the configuration and create the output directory
//! 2. start one sink thread per table
//! 3. execute the domain's stage graph (dimensions first, facts once their
//!    parent dimensions are sealed)
//! 4. join the sinks and report the first error, if any
//!
//! The first failure anywhere cancels the run. Producers stop at their next
//! row, stages that have not started are skipped, and sinks still drain their
//! channels so nothing stays blocked.

use std::fs;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use rayon::ThreadPool;

use crate::config::{Domain, PipelineConfig};
use crate::error::{GenError, Result};
use crate::facts::FactOptions;
use crate::rng::resolve_seed;

pub mod cancel;
mod ecommerce;
pub mod errors;
mod financial;
pub mod graph;
mod medical;
pub mod sinks;

use cancel::CancelToken;
use errors::ErrorCollector;
use graph::StageReport;
use sinks::{SinkSet, TableReport};

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub domain: &'static str,
    pub seed: u64,
    pub tables: Vec<TableReport>,
    pub stages: Vec<StageReport>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }

    pub fn rows(&self, table: &str) -> Option<u64> {
        self.tables.iter().find(|t| t.table == table).map(|t| t.rows)
    }
}

/// Shared state handed to every stage of a run
pub(crate) struct RunContext<'a> {
    pub seed: u64,
    pub workers: usize,
    pub format: crate::sink::OutputFormat,
    /// Pool for dimension generation
    pub pool: &'a ThreadPool,
}

impl RunContext<'_> {
    pub fn fact_options(&self, cancel: &CancelToken) -> FactOptions {
        FactOptions {
            workers: Some(self.workers),
            seed: Some(self.seed),
            cancel: cancel.clone(),
            ..Default::default()
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generate every table of the configured domain
    pub fn run(&self) -> Result<RunReport> {
        let started = Instant::now();
        self.config.validate()?;

        let seed = resolve_seed(self.config.seed);
        let workers = self.config.workers();
        let dir = &self.config.output_dir;
        fs::create_dir_all(dir).map_err(|e| GenError::io(dir, e))?;

        tracing::info!(
            "Generating {} dataset into {} (workers={}, seed={})",
            self.config.domain.name(),
            dir.display(),
            workers,
            seed
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("dimension-{i}"))
            .build()?;
        let ctx = RunContext {
            seed,
            workers,
            format: self.config.format,
            pool: &pool,
        };

        let cancel = CancelToken::new();
        let errors = ErrorCollector::new(cancel.clone());
        let mut sinks = SinkSet::new(
            dir,
            self.config.format,
            self.config.channel_capacity,
            &cancel,
        );

        let stages = match &self.config.domain {
            Domain::Ecommerce(counts) => ecommerce::run(&ctx, counts, &mut sinks, &cancel, &errors),
            Domain::Financial(counts) => financial::run(&ctx, counts, &mut sinks, &cancel, &errors),
            Domain::Medical(counts) => medical::run(&ctx, counts, &mut sinks, &cancel, &errors),
        };
        // Every stage closure (and with it every sender) is gone at this point
        let stages = errors.check(stages).unwrap_or_default();

        let tables = sinks.join(&errors);
        errors.finish()?;

        let report = RunReport {
            domain: self.config.domain.name(),
            seed,
            tables,
            stages,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "Wrote {} rows across {} tables in {:.2?}",
            report.total_rows(),
            report.tables.len(),
            report.elapsed
        );
        Ok(report)
    }
}

/// Sealed output of a completed stage
fn sealed<'a, T>(slot: &'a OnceLock<T>, stage: &str) -> Result<&'a T> {
    slot.get()
        .ok_or_else(|| GenError::Consistency(format!("stage {stage} finished without output")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EcommerceCounts, FinancialCounts, MedicalCounts};
    use crate::sink::OutputFormat;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }

    fn config(dir: &std::path::Path, domain: Domain) -> PipelineConfig {
        PipelineConfig {
            output_dir: dir.to_path_buf(),
            format: OutputFormat::Csv,
            domain,
            max_threads: Some(3),
            channel_capacity: 16,
            seed: Some(1234),
        }
    }

    #[test]
    fn test_ecommerce_run() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let counts = EcommerceCounts {
            customers: 40,
            suppliers: 5,
            categories: 4,
            products: 25,
            orders: 300,
            max_addresses_per_customer: 2,
            max_items_per_order: 3,
        };
        let report = Pipeline::new(config(dir.path(), Domain::Ecommerce(counts)))
            .run()
            .unwrap();

        assert_eq!(report.rows("customers"), Some(40));
        assert_eq!(report.rows("products"), Some(25));
        assert_eq!(report.rows("order_headers"), Some(300));
        assert!(report.rows("order_items").unwrap() >= 300);
        assert!(report
            .stages
            .iter()
            .all(|s| s.status == graph::StageStatus::Completed));
        assert!(dir.path().join("order_items.csv").exists());
    }

    #[test]
    fn test_financial_and_medical_runs() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let financial = FinancialCounts {
            exchanges: 2,
            companies: 7,
            trading_days: 15,
        };
        let report = Pipeline::new(config(dir.path(), Domain::Financial(financial)))
            .run()
            .unwrap();
        assert_eq!(report.rows("daily_stock_prices"), Some(105));

        let medical = MedicalCounts {
            departments: 3,
            doctors: 8,
            patients: 50,
            appointments: 120,
        };
        let report = Pipeline::new(config(dir.path(), Domain::Medical(medical)))
            .run()
            .unwrap();
        assert_eq!(report.rows("appointments"), Some(120));
        assert_eq!(report.rows("doctors"), Some(8));
    }

    #[test]
    fn test_invalid_config_fails_before_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("never-created");
        let mut cfg = config(&out, Domain::default());
        cfg.channel_capacity = 0;
        assert!(matches!(Pipeline::new(cfg).run(), Err(GenError::Config(_))));
        assert!(!out.exists());
    }
}
