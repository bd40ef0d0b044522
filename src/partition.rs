// src/partition.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Splitting `total` fact rows into disjoint per-worker ranges
//!
//! Row indices are 1-based. Every index in `[1, total]` belongs to exactly one
//! worker; fact tables whose ids are the row index (order headers) rely on
//! this for uniqueness and gap-free coverage.

use std::ops::Range;

/// Contiguous slice of the global row index space owned by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerRange {
    pub worker: usize,
    /// First 1-based row index
    pub start: u64,
    /// Number of rows; zero for surplus workers
    pub count: u64,
}

impl WorkerRange {
    /// One past the last row index
    pub fn end(&self) -> u64 {
        self.start + self.count
    }

    pub fn indices(&self) -> Range<u64> {
        self.start..self.end()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Partition `total` rows across `num_workers` workers
///
/// `per_worker = ceil(total / num_workers)`; worker `i` starts at
/// `i * per_worker + 1` and is clamped so nobody runs past `total`.
pub fn partition(total: u64, num_workers: usize) -> Vec<WorkerRange> {
    let num_workers = num_workers.max(1);
    let per_worker = total.div_ceil(num_workers as u64);

    let ranges: Vec<WorkerRange> = (0..num_workers)
        .map(|worker| {
            let start = worker as u64 * per_worker + 1;
            let count = if start > total {
                0
            } else {
                per_worker.min(total - start + 1)
            };
            WorkerRange {
                worker,
                start,
                count,
            }
        })
        .collect();

    tracing::debug!(
        "Partitioned {} rows across {} workers ({} per worker)",
        total,
        num_workers,
        per_worker
    );

    ranges
}
