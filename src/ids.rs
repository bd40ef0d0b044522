// src/ids.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unique ID allocation for fact rows
//!
//! Two strategies:
//! - [`IdGenerator`]: one shared atomic cursor for allocations whose count is
//!   not known up front (order items). Safe from any number of threads.
//! - [`LocalIdGenerator`]: an exclusive `[start, end)` range owned by one
//!   worker. No synchronization at all.

use std::ops::Range;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::constants::{EXHAUSTED_ID, ID_BLOCK_SIZE};

/// Shared, unbounded ID counter
///
/// Every call reserves with a single `fetch_add`, so ids are unique across
/// threads and a batch is always contiguous.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicI64,
    block_size: i64,
}

impl IdGenerator {
    /// Start handing out ids at `start`; `block_size` sizes `reserve_block`
    pub fn new(start: i64, block_size: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
            block_size: block_size.max(1),
        }
    }

    pub fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Reserve `n` contiguous ids in one atomic operation
    pub fn next_batch(&self, n: usize) -> Range<i64> {
        let n = n as i64;
        let start = self.next.fetch_add(n, Ordering::Relaxed);
        start..start + n
    }

    /// Reserve `block_size` ids and hand them out as an exclusive local range
    pub fn reserve_block(&self) -> LocalIdGenerator {
        let Range { start, end } = self.next_batch(self.block_size as usize);
        tracing::trace!("Reserved id block [{}, {})", start, end);
        LocalIdGenerator::new(start, end)
    }

    /// First id that has not been handed out yet
    pub fn peek(&self) -> i64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(1, ID_BLOCK_SIZE)
    }
}

/// Pre-assigned half-open id range `[start, end)` owned by a single worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdGenerator {
    next: i64,
    end: i64,
}

impl LocalIdGenerator {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            next: start,
            end: end.max(start),
        }
    }

    /// Next id in the range, or [`EXHAUSTED_ID`] once the range is used up
    pub fn next_id(&mut self) -> i64 {
        if self.next >= self.end {
            return EXHAUSTED_ID;
        }
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn has_more(&self) -> bool {
        self.next < self.end
    }

    pub fn remaining(&self) -> u64 {
        (self.end - self.next) as u64
    }
}

impl Iterator for LocalIdGenerator {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        self.has_more().then(|| self.next_id())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining() as usize;
        (n, Some(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_shared_ids_unique_under_concurrency() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 10_000;

        let gen = Arc::new(IdGenerator::new(1, 100));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let gen = Arc::clone(&gen);
                thread::spawn(move || (0..PER_THREAD).map(|_| gen.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }
        assert_eq!(seen.len(), THREADS * PER_THREAD);
        assert_eq!(gen.peek(), 1 + (THREADS * PER_THREAD) as i64);
    }

    #[test]
    fn test_batches_never_overlap() {
        let gen = Arc::new(IdGenerator::new(1, 10));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let gen = Arc::clone(&gen);
                thread::spawn(move || {
                    (0..1000)
                        .flat_map(|i| gen.next_batch(1 + (i + t) % 5))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }
    }

    #[test]
    fn test_reserve_block_is_disjoint() {
        let gen = IdGenerator::new(100, 3);
        let a: Vec<i64> = gen.reserve_block().collect();
        let b: Vec<i64> = gen.reserve_block().collect();
        assert_eq!(a, vec![100, 101, 102]);
        assert_eq!(b, vec![103, 104, 105]);
        assert_eq!(gen.next_id(), 106);
    }

    #[test]
    fn test_local_range_exhaustion() {
        let mut local = LocalIdGenerator::new(10, 13);
        assert!(local.has_more());
        assert_eq!(local.next_id(), 10);
        assert_eq!(local.next_id(), 11);
        assert_eq!(local.next_id(), 12);
        assert!(!local.has_more());
        assert_eq!(local.next_id(), EXHAUSTED_ID);
        assert_eq!(local.next_id(), -1);
        assert!(!local.has_more());
    }

    #[test]
    fn test_empty_local_range() {
        let mut local = LocalIdGenerator::new(5, 5);
        assert!(!local.has_more());
        assert_eq!(local.remaining(), 0);
        assert_eq!(local.next_id(), EXHAUSTED_ID);
        assert_eq!(LocalIdGenerator::new(9, 3).remaining(), 0);
    }
}
