// src/config.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run configuration: output location, parallelism, seed and per-table row counts

use std::path::PathBuf;

use crate::constants::*;
use crate::error::{GenError, Result};
use crate::sink::OutputFormat;

/// Row counts for the e-commerce schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcommerceCounts {
    pub customers: usize,
    pub suppliers: usize,
    pub categories: usize,
    pub products: usize,
    /// Order headers; items follow from `max_items_per_order`
    pub orders: u64,
    pub max_addresses_per_customer: usize,
    pub max_items_per_order: usize,
}

impl Default for EcommerceCounts {
    fn default() -> Self {
        Self {
            customers: 10_000,
            suppliers: 200,
            categories: 40,
            products: 5_000,
            orders: 100_000,
            max_addresses_per_customer: MAX_ADDRESSES_PER_CUSTOMER,
            max_items_per_order: MAX_ITEMS_PER_ORDER,
        }
    }
}

/// Row counts for the financial schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinancialCounts {
    pub exchanges: usize,
    pub companies: usize,
    /// Weekday price rows generated per company
    pub trading_days: u64,
}

impl Default for FinancialCounts {
    fn default() -> Self {
        Self {
            exchanges: 5,
            companies: 500,
            trading_days: 252,
        }
    }
}

/// Row counts for the medical schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicalCounts {
    pub departments: usize,
    pub doctors: usize,
    pub patients: usize,
    pub appointments: u64,
}

impl Default for MedicalCounts {
    fn default() -> Self {
        Self {
            departments: 10,
            doctors: 300,
            patients: 20_000,
            appointments: 200_000,
        }
    }
}

/// Which schema a run produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Domain {
    Ecommerce(EcommerceCounts),
    Financial(FinancialCounts),
    Medical(MedicalCounts),
}

impl Default for Domain {
    fn default() -> Self {
        Domain::Ecommerce(EcommerceCounts::default())
    }
}

impl Domain {
    pub fn name(&self) -> &'static str {
        match self {
            Domain::Ecommerce(_) => "ecommerce",
            Domain::Financial(_) => "financial",
            Domain::Medical(_) => "medical",
        }
    }
}

/// Configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory receiving one file per table
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub domain: Domain,
    /// Maximum number of worker threads (None = CPUs in the affinity mask)
    pub max_threads: Option<usize>,
    /// Records (or chunks) buffered per table channel before producers block
    pub channel_capacity: usize,
    /// Random seed for reproducible row content (None = use time + urandom)
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("dgen-output"),
            format: OutputFormat::Csv,
            domain: Domain::default(),
            max_threads: None, // Use all available cores
            channel_capacity: CHANNEL_CAPACITY,
            seed: None, // Use time + urandom
        }
    }
}

impl PipelineConfig {
    /// Reject configurations that would fail mid-run
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(GenError::config("channel_capacity must be at least 1"));
        }
        if self.max_threads == Some(0) {
            return Err(GenError::config("max_threads must be at least 1"));
        }

        match &self.domain {
            Domain::Ecommerce(c) => {
                require("customers", c.customers as u64)?;
                require("suppliers", c.suppliers as u64)?;
                require("categories", c.categories as u64)?;
                require("products", c.products as u64)?;
                require("orders", c.orders)?;
                require("max_addresses_per_customer", c.max_addresses_per_customer as u64)?;
                require("max_items_per_order", c.max_items_per_order as u64)?;
            }
            Domain::Financial(c) => {
                require("exchanges", c.exchanges as u64)?;
                require("companies", c.companies as u64)?;
                require("trading_days", c.trading_days)?;
            }
            Domain::Medical(c) => {
                require("departments", c.departments as u64)?;
                require("doctors", c.doctors as u64)?;
                require("patients", c.patients as u64)?;
                require("appointments", c.appointments)?;
            }
        }
        Ok(())
    }

    /// Worker count actually used for fact fan-out
    pub fn workers(&self) -> usize {
        self.max_threads.unwrap_or_else(get_affinity_cpu_count).max(1)
    }
}

fn require(table: &str, count: u64) -> Result<()> {
    if count == 0 {
        return Err(GenError::config(format!("{table} count must be positive")));
    }
    Ok(())
}

/// Number of CPUs this process may actually run on
///
/// Worker pools are sized from the CPUs `taskset` or a container cpuset
/// leaves to this process, not from the machine total. On Linux the allowed
/// list in `/proc/self/status` is read (and logged); elsewhere, or when it
/// cannot be read, `num_cpus::get()` decides.
pub fn get_affinity_cpu_count() -> usize {
    #[cfg(target_os = "linux")]
    {
        if let Some(count) = allowed_cpus() {
            return count;
        }
    }
    num_cpus::get()
}

#[cfg(target_os = "linux")]
fn allowed_cpus() -> Option<usize> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let list = status
        .lines()
        .find_map(|line| line.strip_prefix("Cpus_allowed_list:"))?
        .trim();
    let count = parse_cpu_list(list);
    tracing::debug!("Affinity allows {} CPUs ({})", count, list);
    (count > 0).then_some(count)
}

/// Count the CPUs in a kernel CPU list such as `0-11,24-35` or `0,2,4`
///
/// Malformed entries are ignored rather than failing worker sizing.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_cpu_list(list: &str) -> usize {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('-') {
            Some((first, last)) => match (first.parse::<usize>(), last.parse::<usize>()) {
                (Ok(first), Ok(last)) if last >= first => last - first + 1,
                _ => 0,
            },
            None => usize::from(entry.parse::<usize>().is_ok()),
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_counts_rejected() {
        let config = PipelineConfig {
            domain: Domain::Ecommerce(EcommerceCounts {
                products: 0,
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("products"), "{}", err);

        let config = PipelineConfig {
            domain: Domain::Medical(MedicalCounts {
                appointments: 0,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GenError::Config(_))));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = PipelineConfig {
            channel_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_cpu_list() {
        assert_eq!(parse_cpu_list("0-23"), 24);
        assert_eq!(parse_cpu_list("0-11,24-35"), 24);
        assert_eq!(parse_cpu_list("3"), 1);
        assert_eq!(parse_cpu_list(""), 0);
        assert_eq!(parse_cpu_list("0,2, 4\n"), 3);
        assert_eq!(parse_cpu_list("7-3,x,1-2"), 2);
    }

    #[test]
    fn test_workers_respects_max_threads() {
        let config = PipelineConfig {
            max_threads: Some(3),
            ..Default::default()
        };
        assert_eq!(config.workers(), 3);
        assert!(PipelineConfig::default().workers() >= 1);
    }
}
