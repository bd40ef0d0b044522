// src/facts/mod.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fact generation: parallel workers over disjoint row ranges
//!
//! Every fact table follows the same shape. The row space is split with
//! [`partition`], each range runs on its own thread of a dedicated rayon pool,
//! rows are streamed into bounded channels, and the first real error cancels
//! the remaining workers.

use std::ops::AddAssign;

use rayon::prelude::*;

use crate::config::get_affinity_cpu_count;
use crate::constants::MAX_ITEMS_PER_ORDER;
use crate::error::{GenError, Result};
use crate::partition::{partition, WorkerRange};
use crate::pipeline::cancel::CancelToken;

pub mod appointments;
pub mod orders;
pub mod stock_prices;

pub use appointments::{generate_appointments, AppointmentInputs};
pub use orders::{generate_facts, OrderInputs};
pub use stock_prices::generate_stock_prices;

/// Options shared by every fact generator
#[derive(Debug, Clone)]
pub struct FactOptions {
    /// Worker threads (None = CPUs in the affinity mask)
    pub workers: Option<usize>,
    /// Random seed for reproducible row content (None = use time + urandom)
    pub seed: Option<u64>,
    pub max_items_per_order: usize,
    pub cancel: CancelToken,
}

impl Default for FactOptions {
    fn default() -> Self {
        Self {
            workers: None,
            seed: None,
            max_items_per_order: MAX_ITEMS_PER_ORDER,
            cancel: CancelToken::new(),
        }
    }
}

impl FactOptions {
    pub fn workers(&self) -> usize {
        self.workers.unwrap_or_else(get_affinity_cpu_count).max(1)
    }
}

/// Row counters of one worker, or summed over all workers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactStats {
    /// Primary fact rows sent (order headers, prices, appointments)
    pub rows: u64,
    /// Child rows sent (order items)
    pub child_rows: u64,
    /// Rows dropped because an invariant did not hold for them
    pub skipped: u64,
}

impl AddAssign for FactStats {
    fn add_assign(&mut self, other: Self) {
        self.rows += other.rows;
        self.child_rows += other.child_rows;
        self.skipped += other.skipped;
    }
}

/// Run `work` once per non-empty worker range on a pool of `workers` threads
///
/// The first non-cancellation error cancels `cancel` and is returned after
/// every worker has stopped. When the token was cancelled from outside and no
/// worker failed on its own, the result is `GenError::Cancelled`.
pub(crate) fn fan_out<F>(
    table: &str,
    total: u64,
    workers: usize,
    cancel: &CancelToken,
    work: F,
) -> Result<FactStats>
where
    F: Fn(WorkerRange) -> Result<FactStats> + Sync,
{
    let ranges: Vec<WorkerRange> = partition(total, workers)
        .into_iter()
        .filter(|r| !r.is_empty())
        .collect();

    let prefix = table.to_string();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ranges.len().max(1))
        .thread_name(move |i| format!("{prefix}-worker-{i}"))
        .build()?;

    tracing::debug!(
        "Fanning out {} {} rows over {} worker(s)",
        total,
        table,
        ranges.len()
    );

    let results: Vec<Result<FactStats>> = pool.install(|| {
        ranges
            .par_iter()
            .with_max_len(1)
            .map(|range| {
                let result = work(*range);
                match &result {
                    Ok(stats) => tracing::trace!(
                        "{} worker {} done: {} rows",
                        table,
                        range.worker,
                        stats.rows
                    ),
                    Err(GenError::Cancelled) => {}
                    Err(err) => {
                        tracing::debug!("{} worker {} failed: {}", table, range.worker, err);
                        cancel.cancel();
                    }
                }
                result
            })
            .collect()
    });

    let mut stats = FactStats::default();
    let mut first_error = None;
    for result in results {
        match result {
            Ok(worker_stats) => stats += worker_stats,
            Err(GenError::Cancelled) => {}
            Err(err) if first_error.is_none() => first_error = Some(err),
            Err(err) => tracing::warn!("Additional {} worker error: {}", table, err),
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }
    if cancel.is_cancelled() {
        return Err(GenError::Cancelled);
    }
    Ok(stats)
}

/// Poll the token between rows
#[inline]
pub(crate) fn check_cancelled(cancel: &CancelToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(GenError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_fan_out_covers_every_row() {
        let seen = AtomicU64::new(0);
        let stats = fan_out("t", 1000, 7, &CancelToken::new(), |range| {
            seen.fetch_add(range.count, Ordering::Relaxed);
            Ok(FactStats {
                rows: range.count,
                ..Default::default()
            })
        })
        .unwrap();
        assert_eq!(stats.rows, 1000);
        assert_eq!(seen.load(Ordering::Relaxed), 1000);
    }

    #[test]
    fn test_fan_out_first_error_cancels() {
        let cancel = CancelToken::new();
        let err = fan_out("t", 100, 4, &cancel, |range| {
            if range.worker == 2 {
                return Err(GenError::Consistency("worker 2".into()));
            }
            Ok(FactStats::default())
        })
        .unwrap_err();
        assert!(matches!(err, GenError::Consistency(_)));
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_fan_out_reports_external_cancellation() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = fan_out("t", 100, 4, &cancel, |_| {
            check_cancelled(&cancel)?;
            Ok(FactStats::default())
        })
        .unwrap_err();
        assert!(matches!(err, GenError::Cancelled));
    }
}
