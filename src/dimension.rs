// src/dimension.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sealed, read-only dimension tables
//!
//! A dimension is generated once per run and then shared with every fact
//! worker. Sealing moves the rows into an `Arc<[T]>`, so once a `Dimension`
//! exists nothing can mutate it and clones are cheap pointer copies.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::Result;
use crate::sampler::WeightedSampler;

/// Rows that carry a primary key
pub trait Keyed {
    fn key(&self) -> i64;
}

/// Ordered, immutable pool of dimension keys (lower index = more popular)
#[derive(Debug, Clone)]
pub struct KeyPool(Arc<[i64]>);

impl KeyPool {
    pub fn new(keys: impl Into<Arc<[i64]>>) -> Self {
        Self(keys.into())
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// Rank-skewed sampler over this pool
    pub fn sampler(&self) -> Result<WeightedSampler> {
        WeightedSampler::new(&self.0)
    }
}

impl Deref for KeyPool {
    type Target = [i64];

    fn deref(&self) -> &[i64] {
        &self.0
    }
}

/// Sealed dimension table: its rows plus the key pool derived from them
#[derive(Debug)]
pub struct Dimension<T> {
    rows: Arc<[T]>,
    keys: KeyPool,
}

impl<T> Clone for Dimension<T> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            keys: self.keys.clone(),
        }
    }
}

impl<T: Keyed> Dimension<T> {
    /// Seal `rows`; key pool order follows row order
    pub fn seal(rows: Vec<T>) -> Self {
        let keys: Vec<i64> = rows.iter().map(Keyed::key).collect();
        Self {
            rows: rows.into(),
            keys: KeyPool::new(keys),
        }
    }
}

impl<T> Dimension<T> {
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn keys(&self) -> &KeyPool {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read-only customer → address ids multimap
///
/// Every shipping/billing address on an order header must come from the
/// list of that header's own customer.
#[derive(Debug, Clone, Default)]
pub struct AddressBook(Arc<HashMap<i64, Vec<i64>>>);

impl AddressBook {
    /// Group `(owner, address)` pairs by owner, keeping input order per owner
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i64, i64)>) -> Self {
        let mut map: HashMap<i64, Vec<i64>> = HashMap::new();
        for (owner, address) in pairs {
            map.entry(owner).or_default().push(address);
        }
        Self(Arc::new(map))
    }

    /// Addresses of `owner`; `None` when the owner has none
    pub fn get(&self, owner: i64) -> Option<&[i64]> {
        self.0
            .get(&owner)
            .map(Vec::as_slice)
            .filter(|list| !list.is_empty())
    }

    /// Number of owners with at least one address
    pub fn owners(&self) -> usize {
        self.0.len()
    }
}
